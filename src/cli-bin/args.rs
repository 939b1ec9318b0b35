const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

#[derive(clap::Parser, Debug)]
#[command(after_help = DEFAULT_AFTER_HELP)]
pub struct Args {
    /// Quiet mode / exit code as analysis result.
    ///
    /// When enabled, a zero exit code means schedulable (or simulation
    /// success), a one means unschedulable (or a detected failure), any
    /// other code means an error occurred before an answer could be reached.
    #[arg(short = 'q', long = "quiet", default_value = "false", action = clap::ArgAction::SetTrue)]
    pub quiet: bool,

    /// Output rendering.
    #[arg(long = "format", value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Rate-monotonic schedulability (utilization bound, then exact RTA).
    Rm(TasksetArgs),
    /// Deadline-monotonic schedulability (exact RTA).
    Dm(TasksetArgs),
    /// Earliest-deadline-first schedulability (processor-demand criterion).
    Edf(TasksetArgs),
    /// Least-slack-time schedulability (same test as EDF: LST is
    /// work-conserving and produces an identical set of met/missed jobs).
    Lst(TasksetArgs),
    /// Audsley's Optimal Priority Assignment for arbitrary deadlines.
    Opa(TasksetArgs),
    /// Simulate a resource-sharing job set under the Priority Inheritance
    /// Protocol.
    Pip(JobsetArgs),
    /// Simulate a resource-sharing job set under the Original Ceiling
    /// Priority Protocol.
    Ocpp(JobsetArgs),
    /// Simulate a resource-sharing job set under the Immediate Ceiling
    /// Priority Protocol.
    Icpp(JobsetArgs),
}

#[derive(clap::Args, Debug)]
pub struct TasksetArgs {
    /// Task-set data file.
    #[arg(short = 'i', long = "input", value_name = "TASKSET FILE")]
    pub taskset_file: String,

    /// Task-set file type.
    #[arg(value_enum, short = 'f', long = "format", value_name = "TYPE", default_value = "auto")]
    pub taskset_file_ty: rt_sched_lab::model::taskset_serde::TasksetFileType,
}

#[derive(clap::Args, Debug)]
pub struct JobsetArgs {
    /// Job-set data file (includes resource requests). The number of
    /// resources is read from the file itself -- the JSON shape carries it
    /// explicitly, the plain-text shape infers it from the highest resource
    /// id referenced.
    #[arg(short = 'i', long = "input", value_name = "JOBSET FILE")]
    pub jobset_file: String,

    /// Job-set file type.
    #[arg(value_enum, short = 'f', long = "format", value_name = "TYPE", default_value = "auto")]
    pub jobset_file_ty: rt_sched_lab::model::taskset_serde::TasksetFileType,
}
