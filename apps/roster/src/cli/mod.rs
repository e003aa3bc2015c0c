//! # Roster CLI Module
//!
//! This module implements the CLI interface for Roster.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `list` - List, search, filter and sort students
//! - `show` - Show one student
//! - `add` - Register a student
//! - `update` - Change fields of a student (`--set field=value`)
//! - `delete` / `bulk-delete` - Remove students
//! - `log` - Append to a student's activity log
//! - `next-id` - Show the id the next registration will receive
//! - `stats` / `analysis` - Aggregate statistics
//! - `export` / `import` - CSV transfer

mod commands;

use crate::config::RosterConfig;
use clap::{Parser, Subcommand};
use roster_core::RosterError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Roster - student record registry
///
/// Validated student records with statistics, CSV transfer and an HTTP API.
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./roster.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the student store
    #[arg(short = 'D', long, global = true)]
    pub data: Option<PathBuf>,

    /// Storage backend: "json", "redb" or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolve the layered configuration and apply this invocation's flags.
    pub fn resolve_config(&self) -> Result<RosterConfig, RosterError> {
        let mut config = RosterConfig::load(self.config.as_deref())?;
        if let Some(data) = &self.data {
            config.data_path.clone_from(data);
        }
        if let Some(backend) = &self.backend {
            config.backend.clone_from(backend);
        }
        if let Some(Commands::Server { host, port }) = &self.command {
            if let Some(host) = host {
                config.host.clone_from(host);
            }
            if let Some(port) = port {
                config.port = *port;
            }
        }
        Ok(config)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List students
    List {
        /// Free-text search
        #[arg(short = 's', long)]
        search: Option<String>,

        /// Letter grade (A, B, C, D, F)
        #[arg(short, long)]
        grade: Option<String>,

        #[arg(long)]
        min_age: Option<u32>,

        #[arg(long)]
        max_age: Option<u32>,

        #[arg(long)]
        min_performance: Option<f64>,

        #[arg(long)]
        max_performance: Option<f64>,

        /// Performance status (excellent, good, average, needs-improvement)
        #[arg(long)]
        status: Option<String>,

        /// Attendance status (excellent, good, average, poor)
        #[arg(long)]
        attendance_status: Option<String>,

        #[arg(long)]
        course: Option<String>,

        #[arg(long)]
        department: Option<String>,

        /// Only students enrolled in the last N days
        #[arg(long)]
        recent_days: Option<u32>,

        /// Sort key (id, name, age, performance, attendance, enrollment_date)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Show one student
    Show {
        /// Student id (e.g. STU001)
        id: String,
    },

    /// Register a new student
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        age: String,

        #[arg(short, long)]
        grade: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        performance: String,

        #[arg(long)]
        course: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        attendance: Option<String>,

        /// Enrollment date (YYYY-MM-DD, default today)
        #[arg(long)]
        enrollment_date: Option<String>,
    },

    /// Update fields of a student
    Update {
        /// Student id
        id: String,

        /// Field assignment, repeatable (e.g. --set grade=A --set age=21)
        #[arg(short, long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Delete a student
    Delete {
        /// Student id
        id: String,
    },

    /// Delete several students; unknown ids are skipped
    BulkDelete {
        /// Student ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Append an activity to a student's log
    Log {
        /// Student id
        id: String,

        /// Activity type (e.g. Assignment, Exam)
        #[arg(short = 't', long = "type")]
        kind: String,

        #[arg(short, long)]
        description: String,
    },

    /// Show the id the next registration will receive
    NextId,

    /// Show aggregate statistics
    Stats,

    /// Show performance analysis
    Analysis,

    /// Export students as CSV
    Export {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import students from CSV
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Parse a `field=value` assignment.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.to_string()))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved configuration.
pub async fn execute(cli: Cli, config: RosterConfig) -> Result<(), RosterError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::List {
            search,
            grade,
            min_age,
            max_age,
            min_performance,
            max_performance,
            status,
            attendance_status,
            course,
            department,
            recent_days,
            sort,
            desc,
        }) => {
            let params = crate::api::ListParams {
                q: search,
                grade,
                min_age,
                max_age,
                min_performance,
                max_performance,
                status,
                attendance_status,
                course,
                department,
                recent_days,
                sort,
                desc,
            };
            cmd_list(&config, json_mode, &params)
        }
        Some(Commands::Show { id }) => cmd_show(&config, json_mode, &id),
        Some(Commands::Add {
            name,
            age,
            grade,
            email,
            performance,
            course,
            phone,
            department,
            attendance,
            enrollment_date,
        }) => {
            let input = roster_core::StudentInput {
                name: Some(name),
                age: Some(age),
                grade: Some(grade),
                email: Some(email),
                performance: Some(performance),
                phone,
                course: Some(course),
                department,
                attendance,
                enrollment_date,
            };
            cmd_add(&config, json_mode, &input)
        }
        Some(Commands::Update { id, set }) => cmd_update(&config, json_mode, &id, set),
        Some(Commands::Delete { id }) => cmd_delete(&config, json_mode, &id),
        Some(Commands::BulkDelete { ids }) => cmd_bulk_delete(&config, json_mode, &ids),
        Some(Commands::Log {
            id,
            kind,
            description,
        }) => cmd_log(&config, json_mode, &id, &kind, &description),
        Some(Commands::NextId) => cmd_next_id(&config, json_mode),
        Some(Commands::Stats) => cmd_stats(&config, json_mode),
        Some(Commands::Analysis) => cmd_analysis(&config, json_mode),
        Some(Commands::Export { output }) => cmd_export(&config, json_mode, output.as_deref()),
        Some(Commands::Import { input }) => cmd_import(&config, json_mode, &input),
        None => {
            // No subcommand - list everything by default
            cmd_list(&config, json_mode, &crate::api::ListParams::default())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("course=A=B").expect("parse"),
            ("course".to_string(), "A=B".to_string())
        );
        assert_eq!(
            parse_assignment("phone=").expect("parse"),
            ("phone".to_string(), String::new())
        );
        assert!(parse_assignment("grade").is_err());
        assert!(parse_assignment("=A").is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "roster",
            "--backend",
            "memory",
            "--data",
            "elsewhere.json",
            "server",
            "--port",
            "9191",
        ])
        .expect("parse");
        let config = cli.resolve_config().expect("config");
        assert_eq!(config.backend, "memory");
        assert_eq!(config.data_path, PathBuf::from("elsewhere.json"));
        assert_eq!(config.port, 9191);
    }

    #[test]
    fn update_requires_an_assignment() {
        assert!(Cli::try_parse_from(["roster", "update", "STU001"]).is_err());
        let cli = Cli::try_parse_from(["roster", "update", "STU001", "--set", "grade=A"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Update { ref set, .. }) if set.len() == 1
        ));
    }
}
