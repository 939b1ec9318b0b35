//! Task-set and job-set file loading: JSON or a line-oriented plain-text
//! format, auto-detected by extension -- the same two-format split the
//! teacher crate uses for its (simpler) single-record task type, here
//! generalized to the two record shapes this system needs.

use crate::error::InputError;
use crate::model::{Job, ResourceRequest, Task};

pub mod prelude {
    pub use super::{parse_jobset, parse_taskset, JobSetFile, TasksetFileType, TasksetParseError};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum TasksetFileType {
    Auto,
    Json,
    Plain,
}

#[derive(Debug, thiserror::Error)]
pub enum TasksetParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plain-text parse error: {0}")]
    Plain(String),
    #[error("validation error: {0}")]
    Validation(#[from] InputError),
}

/// A resource-bearing job set, as read from a `.json` file: the number of
/// resources plus the jobs that reference them.
#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct JobSetFile {
    pub num_resources: u32,
    pub jobs: Vec<Job>,
}

fn detect(path: &std::path::Path, requested: TasksetFileType) -> TasksetFileType {
    if requested != TasksetFileType::Auto {
        return requested;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => TasksetFileType::Json,
        _ => TasksetFileType::Plain,
    }
}

/// Parse a non-resource task set (`id wcet period deadline` per line, or
/// JSON array of [`Task`]) and validate it per spec's input rules.
pub fn parse_taskset(path: &str, typ: TasksetFileType) -> Result<Vec<Task>, TasksetParseError> {
    let path = std::path::Path::new(path);
    let typ = detect(path, typ);
    let data = std::fs::read_to_string(path)?;

    let tasks: Vec<Task> = match typ {
        TasksetFileType::Auto => unreachable!("detect() resolves Auto"),
        TasksetFileType::Json => serde_json::from_str(&data)?,
        TasksetFileType::Plain => parse_plain_tasks(&data)?,
    };

    validate_tasks(&tasks)?;
    Ok(tasks)
}

/// Parse a resource-bearing job set (`id release wcet priority period
/// deadline [resource:duration]*` per line, or the [`JobSetFile`] JSON
/// shape) and validate it per spec's input rules.
pub fn parse_jobset(path: &str, typ: TasksetFileType) -> Result<(Vec<Job>, u32), TasksetParseError> {
    let path = std::path::Path::new(path);
    let typ = detect(path, typ);
    let data = std::fs::read_to_string(path)?;

    let (mut jobs, num_resources): (Vec<Job>, u32) = match typ {
        TasksetFileType::Auto => unreachable!("detect() resolves Auto"),
        TasksetFileType::Json => {
            let file: JobSetFile = serde_json::from_str(&data)?;
            (file.jobs, file.num_resources)
        }
        TasksetFileType::Plain => parse_plain_jobs(&data)?,
    };

    for job in &mut jobs {
        job.reset();
    }
    validate_jobs(&jobs, num_resources)?;
    Ok((jobs, num_resources))
}

fn parse_plain_tasks(data: &str) -> Result<Vec<Task>, TasksetParseError> {
    data.trim().lines().filter(|l| !l.trim().is_empty()).map(parse_plain_task).collect()
}

fn parse_plain_task(line: &str) -> Result<Task, TasksetParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(TasksetParseError::Plain(format!(
            "expected 'id wcet period deadline', got: {line}"
        )));
    }
    let parse = |s: &str, field: &str| -> Result<u64, TasksetParseError> {
        s.parse().map_err(|_| TasksetParseError::Plain(format!("bad {field}: {s}")))
    };
    Ok(Task::new(
        parse(fields[0], "id")? as u32,
        parse(fields[1], "wcet")?,
        parse(fields[2], "period")?,
        parse(fields[3], "deadline")?,
    ))
}

fn parse_plain_jobs(data: &str) -> Result<(Vec<Job>, u32), TasksetParseError> {
    let mut jobs = Vec::new();
    let mut max_resource = 0u32;
    for line in data.trim().lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(TasksetParseError::Plain(format!(
                "expected 'id release wcet priority period deadline [resource:duration]*', got: {line}"
            )));
        }
        let parse = |s: &str, field: &str| -> Result<u64, TasksetParseError> {
            s.parse().map_err(|_| TasksetParseError::Plain(format!("bad {field}: {s}")))
        };
        let id = parse(fields[0], "id")? as u32;
        let release = parse(fields[1], "release")?;
        let wcet = parse(fields[2], "wcet")?;
        let priority = parse(fields[3], "priority")? as u32;
        let period = parse(fields[4], "period")?;
        let deadline = parse(fields[5], "deadline")?;

        let mut resource_sequence = Vec::new();
        for field in &fields[6..] {
            let (r, d) = field.split_once(':').ok_or_else(|| {
                TasksetParseError::Plain(format!("bad resource request '{field}', expected res:duration"))
            })?;
            let resource: u32 = r
                .parse()
                .map_err(|_| TasksetParseError::Plain(format!("bad resource id: {r}")))?;
            let duration: u64 = d
                .parse()
                .map_err(|_| TasksetParseError::Plain(format!("bad duration: {d}")))?;
            max_resource = max_resource.max(resource);
            resource_sequence.push(ResourceRequest::new(resource, duration));
        }

        jobs.push(Job::new(id, release, wcet, priority, period, deadline, resource_sequence));
    }
    Ok((jobs, max_resource))
}

fn validate_tasks(tasks: &[Task]) -> Result<(), InputError> {
    if tasks.is_empty() {
        return Err(InputError::EmptyTaskSet);
    }
    for task in tasks {
        if task.wcet == crate::model::Time::ZERO {
            return Err(InputError::NonPositiveWcet { task: task.id });
        }
        if task.period == crate::model::Time::ZERO {
            return Err(InputError::NonPositivePeriod { task: task.id });
        }
        if task.deadline == crate::model::Time::ZERO {
            return Err(InputError::NonPositiveDeadline { task: task.id });
        }
    }
    Ok(())
}

fn validate_jobs(jobs: &[Job], num_resources: u32) -> Result<(), InputError> {
    if jobs.is_empty() {
        return Err(InputError::EmptyTaskSet);
    }
    for job in jobs {
        if job.wcet == crate::model::Time::ZERO {
            return Err(InputError::NonPositiveWcet { task: job.id });
        }
        if job.period == crate::model::Time::ZERO {
            return Err(InputError::NonPositivePeriod { task: job.id });
        }
        if job.deadline == crate::model::Time::ZERO {
            return Err(InputError::NonPositiveDeadline { task: job.id });
        }
        if job.base_priority == crate::model::Priority::UNASSIGNED {
            return Err(InputError::NonPositiveBasePriority { job: job.id });
        }
        let mut total = crate::model::Time::ZERO;
        for req in &job.resource_sequence {
            if req.resource.0 == 0 || req.resource.0 > num_resources {
                return Err(InputError::UnknownResource { job: job.id, resource: req.resource });
            }
            if req.duration == crate::model::Time::ZERO {
                return Err(InputError::NonPositiveDuration { job: job.id });
            }
            total += req.duration;
        }
        if total > job.wcet {
            return Err(InputError::DurationExceedsWcet { job: job.id, requested: total, wcet: job.wcet });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_taskset() {
        let data = "1 21 80 80\n2 9 25 25\n3 4 20 20\n";
        let tasks = parse_plain_tasks(data).unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].wcet, crate::model::Time::new(21));
    }

    #[test]
    fn rejects_duration_exceeding_wcet() {
        let jobs = vec![Job::new(1, 0, 2, 1, 10, 10, vec![ResourceRequest::new(1, 5)])];
        assert!(matches!(
            validate_jobs(&jobs, 1),
            Err(InputError::DurationExceedsWcet { .. })
        ));
    }

    #[test]
    fn rejects_unknown_resource() {
        let jobs = vec![Job::new(1, 0, 5, 1, 10, 10, vec![ResourceRequest::new(3, 1)])];
        assert!(matches!(
            validate_jobs(&jobs, 1),
            Err(InputError::UnknownResource { .. })
        ));
    }
}
