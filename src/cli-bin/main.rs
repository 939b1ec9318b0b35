use clap::Parser;

use rt_sched_lab::feasibility;
use rt_sched_lab::model::taskset_serde::{parse_jobset, parse_taskset};
use rt_sched_lab::simulate::{preemptive, resources, Algorithm, ResourceProtocol};
use rt_sched_lab::{analyses, priority};

use crate::args::{Args, Command};

pub mod args;
pub mod report;

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;
            let exit_code = match err.kind() {
                DisplayHelp | DisplayHelpOnMissingArgumentOrSubcommand | DisplayVersion => 0,
                _ => 2,
            };
            err.print().unwrap();
            std::process::exit(exit_code);
        }
    };

    let quiet = args.quiet;
    match run(args) {
        Ok(success) => {
            if quiet {
                std::process::exit(if success { 0 } else { 1 });
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let format = args.format;

    match args.command {
        Command::Rm(t) => {
            let mut tasks = parse_taskset(&t.taskset_file, t.taskset_file_ty)?;
            priority::assign(&mut tasks, priority::Policy::RateMonotonic)?;
            let verdict = analyses::fixed_priority::is_schedulable(&tasks);
            let ok = verdict.schedulable;
            report::render_verdict(&verdict, format);
            if ok {
                let horizon = feasibility::hyperperiod(&tasks);
                report::render_timeline(&preemptive::simulate(&tasks, Algorithm::RateMonotonic, horizon), format);
            }
            Ok(ok)
        }
        Command::Dm(t) => {
            let mut tasks = parse_taskset(&t.taskset_file, t.taskset_file_ty)?;
            priority::assign(&mut tasks, priority::Policy::DeadlineMonotonic)?;
            let verdict = analyses::fixed_priority::is_schedulable(&tasks);
            let ok = verdict.schedulable;
            report::render_verdict(&verdict, format);
            if ok {
                let horizon = feasibility::hyperperiod(&tasks);
                report::render_timeline(&preemptive::simulate(&tasks, Algorithm::DeadlineMonotonic, horizon), format);
            }
            Ok(ok)
        }
        Command::Edf(t) => {
            let tasks = parse_taskset(&t.taskset_file, t.taskset_file_ty)?;
            let verdict = analyses::edf::is_schedulable(&tasks);
            let ok = verdict.schedulable;
            report::render_verdict(&verdict, format);
            if ok {
                let horizon = feasibility::hyperperiod(&tasks);
                report::render_timeline(&preemptive::simulate(&tasks, Algorithm::EarliestDeadlineFirst, horizon), format);
            }
            Ok(ok)
        }
        Command::Lst(t) => {
            let tasks = parse_taskset(&t.taskset_file, t.taskset_file_ty)?;
            let verdict = analyses::edf::is_schedulable(&tasks);
            let ok = verdict.schedulable;
            report::render_verdict(&verdict, format);
            if ok {
                let horizon = feasibility::hyperperiod(&tasks);
                report::render_timeline(&preemptive::simulate(&tasks, Algorithm::LeastSlackTime, horizon), format);
            }
            Ok(ok)
        }
        Command::Opa(t) => {
            let mut tasks = parse_taskset(&t.taskset_file, t.taskset_file_ty)?;
            let result = preemptive::simulate_after_opa(&mut tasks)?;
            let ok = result.is_some();
            let assignment = result.as_ref().map(|(assignment, _)| assignment.clone());
            report::render_assignment(&assignment, format);
            if let Some((_, timeline)) = &result {
                report::render_timeline(timeline, format);
            }
            Ok(ok)
        }
        Command::Pip(j) => run_resource_sim(j, ResourceProtocol::PriorityInheritance, format),
        Command::Ocpp(j) => run_resource_sim(j, ResourceProtocol::OriginalCeiling, format),
        Command::Icpp(j) => run_resource_sim(j, ResourceProtocol::ImmediateCeiling, format),
    }
}

fn run_resource_sim(
    j: crate::args::JobsetArgs,
    protocol: ResourceProtocol,
    format: crate::args::OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (jobs, num_resources) = parse_jobset(&j.jobset_file, j.jobset_file_ty)?;
    let resource_set = rt_sched_lab::model::resources_from_jobs(&jobs, num_resources);
    let outcome = resources::simulate(jobs, resource_set, protocol);
    let ok = outcome.success();
    report::render_sim_outcome(&outcome, format);
    Ok(ok)
}
