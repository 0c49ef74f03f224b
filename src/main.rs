use anyhow::{Context, bail};

use door_trace::client::{CaptureSummary, sweep_guesses};
use door_trace::util::{self, telemetry};
use door_trace::plot::Guide;
use door_trace::{Chart, Door, hints};

mod args;

use args::{Command, PlotArgs, ServerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` has to be loaded before clap reads DOOR_ADDRESS / DOOR_SEED
    _ = dotenvy::dotenv();

    let args = args::parse_cli_args();
    telemetry::register(args.verbose);
    tracing::debug!(command = ?args.command, "parsed command line");

    match args.command {
        Command::Hint { number } => print_hints(number)?,

        Command::Fetch { guess } => {
            let door = args.server.build_door()?;
            let capture = door.fetch_trace(args.server.guess(&guess)).await?;

            let summary = CaptureSummary::from(&capture);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Unlock {
            guesses,
            repeat,
            plot,
        } => {
            let guesses: Vec<String> = guesses
                .iter()
                .flat_map(|g| std::iter::repeat_n(g.clone(), repeat.get()))
                .collect();
            plot_guesses(&args.server, &guesses, &plot, Vec::new()).await?;
        }

        Command::Sweep {
            prefix,
            width,
            fill,
            guides,
            plot,
        } => {
            let guesses = sweep_guesses(&prefix, width, fill);
            let guides = match guides {
                true => hints::sweep_guides(),
                false => Vec::new(),
            };
            plot_guesses(&args.server, &guesses, &plot, guides).await?;
        }
    }

    Ok(())
}

/// Fetches each guess in turn onto a single chart and writes it out.
///
/// A failed fetch is logged and skipped so the remaining guesses still make it onto the chart.
async fn plot_guesses(
    server: &ServerArgs,
    guesses: &[String],
    plot: &PlotArgs,
    guides: Vec<Guide>,
) -> anyhow::Result<()> {
    let door: Door = server.build_door()?;
    let options = plot.options()?;
    let mut chart = match &plot.title {
        Some(title) => Chart::new(title),
        None => Chart::default(),
    };
    guides.into_iter().for_each(|g| chart.add_guide(g));

    for guess in guesses {
        if let Err(e) = door.unlock(&mut chart, server.guess(guess), &options).await {
            tracing::warn!(%guess, error = %e, "skipping guess");
            eprintln!("[x] {}: {}", guess, e);
        }
    }

    if chart.series().is_empty() {
        bail!("none of the {} guess(es) produced a plottable capture", guesses.len());
    }

    let output = plot
        .output
        .clone()
        .unwrap_or_else(|| util::default_output().into());
    chart
        .render_svg(&output)
        .with_context(|| format!("while writing chart to {}", output.display()))?;

    println!(
        "[+] plotted {}/{} capture(s) to {}",
        chart.series().len(),
        guesses.len(),
        output.display()
    );

    Ok(())
}

fn print_hints(number: Option<usize>) -> anyhow::Result<()> {
    match number {
        Some(n) => {
            let hint = hints::get(n).with_context(|| format!("there is no hint #{}", n))?;
            println!("Hint {}: {}\n\n{}", hint.number, hint.title, hint.body);
        }
        None => {
            for hint in hints::all() {
                println!("Hint {}: {}\n\n{}\n", hint.number, hint.title, hint.body);
            }
        }
    }

    Ok(())
}
