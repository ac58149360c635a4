use clap::Parser;

/// Resolves a book club election held with ranked choices.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: where the votes are,
    /// which date to count and the rules.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, bookvote will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The vote sheet. Setting this option overrides the file that may be specified
    /// with the --config option. A relative path is read from the current directory, not from the
    /// directory of the configuration file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (date as written in the vote sheet) If specified, only the votes cast on that date are counted.
    #[clap(long, value_parser)]
    pub vote_date: Option<String>,

    /// When using an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
