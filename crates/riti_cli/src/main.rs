use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use riti_cli::cli::{Cli, Command, ListCommand, collect_config_overrides};
use riti_cli::{input, logging, render};
use riti_core::config::{self, Config};
use riti_core::error::AppError;
use riti_core::model::{Recurrence, Task, TaskDraft};
use riti_core::storage::{JsonStore, json_store};
use riti_core::{Saved, TaskStore};
use std::io::{self, BufRead};
use std::path::Path;
use time::OffsetDateTime;

type Store = TaskStore<JsonStore>;

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn warn_if_unsaved<T>(saved: &Saved<T>) {
    if let Some(err) = saved.save_error.as_ref() {
        eprintln!("WARNING: {err} (the change may not survive a restart)");
    }
}

fn load_base_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: ignoring config: {err}");
    }
    loaded.config
}

fn resolve_config(base: &Config, raw_overrides: &[String]) -> Result<Config, AppError> {
    let overrides = collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(base, &overrides))
}

fn open_store(config: &Config) -> Result<Store, AppError> {
    let path = json_store::store_path(config.store_path.as_deref())?;
    tracing::debug!(path = %path.display(), "opening task store");
    TaskStore::open(JsonStore::new(path))
}

fn print_task(task: &Task, json: bool, verb: &str) {
    if json {
        println!("{}", render::task_summary_json(task));
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
}

fn print_list(tasks: Vec<&Task>, json: bool) {
    if json {
        println!("{}", render::tasks_json(tasks));
    } else {
        let now = OffsetDateTime::now_utc();
        println!("{}", render::tasks_table(tasks, now, input::local_offset()));
    }
}

fn run_command(store: &mut Store, config: &Config, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            description,
            recurrence,
            due,
            reward,
            every,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value.trim().to_string(),
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let offset = input::local_offset();
            let due_date = match due {
                Some(raw) => input::parse_datetime(&raw, offset)?,
                None => OffsetDateTime::now_utc().to_offset(offset),
            };

            let draft = TaskDraft {
                title,
                description: description.unwrap_or_default().trim().to_string(),
                recurrence: recurrence.parse::<Recurrence>()?,
                due_date,
                reward: reward.unwrap_or_else(|| config.reward_or_default()),
                is_recurring: every.is_some(),
                recurring_interval: every,
            };
            input::validate_draft(&draft)?;

            let saved = store.add(draft);
            warn_if_unsaved(&saved);
            print_task(&saved.outcome, cli.json, "Added");
        }
        Command::Edit {
            id,
            title,
            description,
            recurrence,
            due,
            reward,
            every,
            no_repeat,
        } => {
            let id = id.trim();
            let mut task = store
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::not_found(id))?;

            if let Some(value) = title {
                task.title = value.trim().to_string();
            }
            if let Some(value) = description {
                task.description = value.trim().to_string();
            }
            if let Some(value) = recurrence {
                task.recurrence = value.parse()?;
            }
            if let Some(raw) = due {
                task.due_date = input::parse_datetime(&raw, input::local_offset())?;
            }
            if let Some(value) = reward {
                task.reward = value;
            }
            if let Some(interval) = every {
                task.is_recurring = true;
                task.recurring_interval = Some(interval);
            }
            if no_repeat {
                task.is_recurring = false;
                task.recurring_interval = None;
            }
            input::validate_task(&task)?;

            let saved = store.edit(task);
            warn_if_unsaved(&saved);
            let task = saved.outcome.into_result(id)?;
            print_task(&task, cli.json, "Updated");
        }
        Command::Delete { id } => {
            let id = id.trim();
            let saved = store.delete(id);
            warn_if_unsaved(&saved);
            let task = saved.outcome.into_result(id)?;
            print_task(&task, cli.json, "Deleted");
        }
        Command::Show { id } => {
            let id = id.trim();
            let task = store.get(id).ok_or_else(|| AppError::not_found(id))?;
            if cli.json {
                println!("{}", render::task_json(task)?);
            } else {
                println!("{}", render::task_details(task, input::local_offset()));
            }
        }
        Command::Done { id, proof } => {
            let id = id.trim();
            let task = store.get(id).ok_or_else(|| AppError::not_found(id))?;
            if task.completed {
                return Err(AppError::invalid_state(format!(
                    "task {id} is already completed"
                )));
            }
            let proof = proof
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::invalid_input("proof image is required (--proof <IMAGE>)"))?;
            let proof_image = input::proof_data_url(Path::new(proof.trim()))?;

            let saved = store.complete(id, proof_image);
            warn_if_unsaved(&saved);
            let (task, successor) = saved.outcome.into_result(id)?;

            if cli.json {
                let payload = serde_json::json!({
                    "task": render::task_summary_json(&task),
                    "earned": task.reward,
                    "balance": store.balance(),
                    "successor": successor.as_ref().map(render::task_summary_json),
                });
                println!("{payload}");
            } else {
                println!(
                    "Completed task: {} ({}), earned {} coins. Balance: {}",
                    task.title,
                    task.id,
                    task.reward,
                    store.balance()
                );
                if let Some(next) = successor {
                    println!(
                        "Next occurrence: {} due {}",
                        next.id,
                        render::format_instant(next.due_date, input::local_offset())
                    );
                }
            }
        }
        Command::List { list } => {
            let tasks = match list {
                ListCommand::Daily => store.by_category(Recurrence::Daily),
                ListCommand::Weekly => store.by_category(Recurrence::Weekly),
                ListCommand::Monthly => store.by_category(Recurrence::Monthly),
                ListCommand::Completed => store.completed_list(),
                ListCommand::Upcoming => store.upcoming(),
                ListCommand::All => store.tasks().iter().collect(),
            };
            print_list(tasks, cli.json);
        }
        Command::Balance => {
            if cli.json {
                println!("{}", serde_json::json!({ "balance": store.balance() }));
            } else {
                println!("Balance: {} coins", store.balance());
            }
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(AppError::invalid_input(
                    "reset deletes every task and the balance; pass --yes to confirm",
                ));
            }
            let saved = store.reset();
            warn_if_unsaved(&saved);
            if cli.json {
                println!("{}", serde_json::json!({ "removed": saved.outcome, "balance": 0 }));
            } else {
                println!("Reset: removed {} tasks, balance is now 0", saved.outcome);
            }
        }
    }

    Ok(())
}

fn run_interactive(store: &mut Store, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("riti".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if is_informational(&err) => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        // The store is already open, so a store_path override has no effect here.
        let line_config = match resolve_config(config, &cli.config_override) {
            Ok(line_config) => line_config,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if let Err(err) = run_command(store, &line_config, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let config = load_base_config();
        logging::init(config.log_filter_or_default());
        let result = open_store(&config).and_then(|mut store| run_interactive(&mut store, &config));
        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let config = match resolve_config(&load_base_config(), &cli.config_override) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };
    logging::init(config.log_filter_or_default());

    let mut store = match open_store(&config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(&mut store, &config, cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
