use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use door_trace::client::door::{DEFAULT_LABEL, DEFAULT_SEED, SERVER_ADDR, SERVER_PORT};
use door_trace::client::types::{DEFAULT_RESULT_FIELD, DEFAULT_TRACE_FIELD, DEFAULT_VALUE_FIELD};
use door_trace::{Crop, Door, DoorResult, Guess, PlotOptions, PlotResult, Tier};

#[derive(Parser, Debug)]
#[command(name = "door", version, about = "Fetch and compare side-channel captures from a door server")]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// `HOST:PORT` of the capture server
    #[arg(long, env = "DOOR_ADDRESS", default_value_t = format!("{}:{}", SERVER_ADDR, SERVER_PORT), global = true)]
    pub address: String,

    /// Exercise difficulty (server endpoint)
    #[arg(long, value_enum, default_value_t = Tier::Basic, global = true)]
    pub tier: Tier,

    /// Custom URI path on the server; overrides --tier
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// Query parameter label, repeated once per value in a guess
    #[arg(long = "label", default_value = DEFAULT_LABEL, global = true)]
    pub labels: Vec<String>,

    /// Seed sent with every request (padded with 'x' to 8 characters)
    #[arg(long, env = "DOOR_SEED", default_value = DEFAULT_SEED, global = true)]
    pub seed: String,

    /// Do not send a seed at all
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Response field holding the hex-encoded trace
    #[arg(long, default_value = DEFAULT_TRACE_FIELD, global = true)]
    pub trace_field: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,
}

impl ServerArgs {
    pub fn build_door(&self) -> DoorResult<Door> {
        let mut builder = Door::builder()
            .address(&self.address)
            .tier(self.tier)
            .labels(&self.labels)
            .seed((!self.no_seed).then_some(self.seed.as_str()))
            .trace_field(&self.trace_field)
            .timeout(Duration::from_secs(self.timeout));

        if let Some(path) = &self.path {
            builder = builder.path(path);
        }

        builder.build()
    }

    /// Splits a command line guess into one value per label; values are comma separated when more
    /// than one label is configured.
    pub fn guess(&self, raw: &str) -> Guess {
        match self.labels.len() {
            1 => Guess::from(raw),
            _ => Guess::new(raw.split(',')),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlotArgs {
    /// Box-car smoothing window in samples
    #[arg(short, long, default_value = "1")]
    pub smooth: NonZeroUsize,

    /// Only plot sample indices START..END
    #[arg(short, long, num_args = 2, value_names = ["START", "END"])]
    pub crop: Option<Vec<usize>>,

    /// Keep every Nth sample
    #[arg(short, long, default_value = "1")]
    pub decimate: NonZeroUsize,

    /// Response field holding the requested value
    #[arg(long, default_value = DEFAULT_VALUE_FIELD)]
    pub value_field: String,

    /// Use the value field as-is instead of hex-decoding it for the legend
    #[arg(long)]
    pub raw_label: bool,

    /// Response field holding the server's verdict
    #[arg(long, default_value = DEFAULT_RESULT_FIELD)]
    pub result_field: String,

    /// Chart title
    #[arg(long)]
    pub title: Option<String>,

    /// SVG file to write (defaults to a time-stamped name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl PlotArgs {
    pub fn options(&self) -> PlotResult<PlotOptions> {
        let mut options = PlotOptions::default()
            .smooth(self.smooth.get())?
            .decimate(self.decimate.get())?
            .value_field(&self.value_field, !self.raw_label)
            .result_field(&self.result_field);

        if let Some([start, end]) = self.crop.as_deref() {
            options = options.crop(Crop::new(*start, *end)?);
        }

        Ok(options)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a single capture and print its fields
    Fetch { guess: String },

    /// Fetch captures for each guess and plot them on one chart
    Unlock {
        #[arg(required = true)]
        guesses: Vec<String>,

        /// Fetch each guess this many times
        #[arg(short, long, default_value = "1")]
        repeat: NonZeroUsize,

        #[command(flatten)]
        plot: PlotArgs,
    },

    /// Plot every digit 0-9 at the position after PREFIX
    Sweep {
        /// Characters already recovered
        #[arg(long, default_value = "")]
        prefix: String,

        /// Total guess length
        #[arg(long, default_value_t = 4)]
        width: usize,

        /// Padding after the swept digit
        #[arg(long, default_value_t = '0')]
        fill: char,

        /// Overlay the trace-group guides from hint 6
        #[arg(long)]
        guides: bool,

        #[command(flatten)]
        plot: PlotArgs,
    },

    /// Print one hint, or all of them
    Hint { number: Option<usize> },
}

pub fn parse_cli_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unlock_args() {
        let cli = Cli::try_parse_from([
            "door", "unlock", "0000", "1000", "--smooth", "25", "--crop", "900", "1000",
        ])
        .unwrap();

        let Command::Unlock { guesses, plot, .. } = cli.command else {
            panic!("expected unlock");
        };
        assert_eq!(guesses, vec!["0000", "1000"]);

        let options = plot.options().unwrap();
        assert_eq!(options.smooth, 25);
        assert_eq!(options.crop, Some(Crop::new(900, 1000).unwrap()));
        assert!(options.label_decode);
    }

    #[test]
    fn test_sweep_guides_flag() {
        let cli = Cli::try_parse_from(["door", "sweep", "--prefix", "6", "--guides"]).unwrap();

        let Command::Sweep {
            prefix,
            width,
            guides,
            ..
        } = cli.command
        else {
            panic!("expected sweep");
        };
        assert_eq!(prefix, "6");
        assert_eq!(width, 4);
        assert!(guides);
    }

    #[test]
    fn test_zero_smoothing_rejected() {
        assert!(Cli::try_parse_from(["door", "unlock", "0000", "--smooth", "0"]).is_err());
    }

    #[test]
    fn test_multi_label_guess() {
        let cli = Cli::try_parse_from([
            "door", "--label", "user", "--label", "pin", "--no-seed", "fetch", "me,1234",
        ])
        .unwrap();

        assert_eq!(cli.server.labels, vec!["user", "pin"]);
        assert_eq!(cli.server.guess("me,1234"), Guess::from(vec!["me", "1234"]));

        let door = cli.server.build_door().unwrap();
        assert_eq!(door.seed(), None);
        assert_eq!(door.path(), Tier::Basic.path());
    }
}
