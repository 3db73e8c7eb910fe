use clap::Parser;

/// Tabulates ranked-choice elections and writes the vote transfers as a flow diagram.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the election data.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default json) The type of the input: json or xlsx. See the manual for the layout of each format.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the summary of the election in JSON format.
    /// It is printed on the standard output by default.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of an election in JSON format. If provided,
    /// irvflow will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default: the name of the input file) The name of the contest, for inputs that do not provide one.
    #[clap(long, value_parser)]
    pub contest_name: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
