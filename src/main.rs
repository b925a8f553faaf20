use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::path::Path;

use trends_cli::api_client::ApiClient;
use trends_cli::config::Config;
use trends_cli::export::export_hits_csv;
use trends_cli::health::HealthMonitor;
use trends_cli::models::SearchPatch;
use trends_cli::notes::Notes;
use trends_cli::search_controller::split_query_input;
use trends_cli::session::{AuthState, CallbackParams, SessionManager};
use trends_cli::table_display::display_hits;
use trends_cli::tui_app::TuiApp;
use trends_cli::watchlist::WatchlistStore;

fn print_help() {
    println!("{}", "Insider Trends CLI - trend analytics terminal".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  trends-cli [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}      - One-shot search, print a table and exit",
        "--classic <query>".green()
    );
    println!(
        "  {}    - With --classic, also write results to CSV",
        "--export <FILE.csv>".green()
    );
    println!("  {}      - Sign in and store the token", "--login <email>".green());
    println!(
        "  {} - Complete sign-in from an OAuth callback URL",
        "--callback-url <URL>".green()
    );
    println!("  {}            - Probe the backend and exit", "--health".green());
    println!(
        "  {}  - Write a commented config file with defaults",
        "--generate-config".green()
    );
    println!("  {}     - Print the config file location", "--config-path".green());
    println!("  {}             - Show this help", "--help".green());
    println!();
    println!("{}", "TUI keys:".yellow());
    println!("  {}     - Switch between Search / Watchlist / Session", "Tab".green());
    println!("  {}   - Execute the current search", "Enter".green());
    println!("  {} - Toggle platform / cycle sort", "F2 / F3".green());
    println!("  {}  - Watch the selected author", "Ctrl+W".green());
    println!("  {}  - Yank the selected permalink", "Ctrl+Y".green());
    println!("  {}  - Quit", "Ctrl+Q".green());
    println!();
    println!(
        "Backend URL comes from the config file or {}.",
        "TRENDS_API_URL".green()
    );
    println!();
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .map(|s| s.to_string())
}

fn read_password(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() {
    let logs = trends_cli::logging::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.contains(&"--help".to_string()) {
        print_help();
        return;
    }

    if args.contains(&"--generate-config".to_string()) {
        match Config::path() {
            Ok(path) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        eprintln!("Error creating config directory: {}", e);
                        std::process::exit(1);
                    }
                }
                if let Err(e) = std::fs::write(&path, Config::template()) {
                    eprintln!("Error writing config file: {}", e);
                    std::process::exit(1);
                }
                println!("Configuration file created at: {:?}", path);
                println!("Edit this file to customize trends-cli.");
                return;
            }
            Err(e) => {
                eprintln!("Error determining config path: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.contains(&"--config-path".to_string()) {
        match Config::path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                eprintln!("Error determining config path: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    let base_url =
        std::env::var("TRENDS_API_URL").unwrap_or_else(|_| config.api.base_url.clone());
    let mut client = ApiClient::new(&base_url);

    if args.contains(&"--health".to_string()) {
        let mut monitor = HealthMonitor::new(config.behavior.health_poll_secs);
        monitor.probe_now(&client);
        println!("{} ({})", monitor.status().label(), base_url);
        return;
    }

    let mut session = match SessionManager::with_default_path() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error locating data directory: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(email) = flag_value(&args, "--login") {
        let password = match read_password("Password: ") {
            Ok(password) => password,
            Err(e) => {
                eprintln!("Error reading password: {}", e);
                std::process::exit(1);
            }
        };
        match client.login(&email, &password) {
            Ok(token) => {
                session.establish(&mut client, token.access_token, token.user);
                println!("{}", format!("Signed in as {}", email).green());
            }
            Err(e) => {
                eprintln!("{}", format!("Sign-in failed: {}", e).red());
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(url) = flag_value(&args, "--callback-url") {
        let callback = match CallbackParams::parse(&url) {
            Ok(callback) => callback,
            Err(e) => {
                eprintln!("{}", format!("Bad callback URL: {}", e).red());
                std::process::exit(1);
            }
        };
        session.bootstrap(&mut client, Some(&callback));
        match session.state() {
            AuthState::Authenticated(s) => {
                println!("{}", format!("Signed in as {}", s.user.email).green());
            }
            AuthState::Unauthenticated { error } => {
                let reason = error.as_deref().unwrap_or("no token in callback");
                eprintln!("{}", format!("Sign-in failed: {}", reason).red());
                std::process::exit(1);
            }
            AuthState::Resolving => unreachable!("bootstrap always settles"),
        }
        return;
    }

    // No callback: resume whatever session the token file holds.
    session.bootstrap(&mut client, None);

    if let Some(query) = flag_value(&args, "--classic") {
        let mut params = trends_cli::models::SearchParams {
            platform: config.platform(),
            sort: config.sort(),
            limit: config.behavior.page_size,
            ..Default::default()
        };
        params.merge(split_query_input(&query));
        if !params.has_query() {
            eprintln!("Nothing to search for.");
            std::process::exit(1);
        }
        // Keep --classic honest about date flags too.
        params.merge(SearchPatch {
            date_from: flag_value(&args, "--from"),
            date_to: flag_value(&args, "--to"),
            ..Default::default()
        });

        match client.search_posts(&params) {
            Ok(response) => {
                display_hits(&response);
                if let Some(file) = flag_value(&args, "--export") {
                    match export_hits_csv(Path::new(&file), &response.hits) {
                        Ok(count) => println!("Exported {} rows to {}", count, file),
                        Err(e) => {
                            eprintln!("Export failed: {}", e);
                            std::process::exit(1);
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("{}", format!("Search failed: {}", e).red());
                std::process::exit(1);
            }
        }
        return;
    }

    let watchlist = match WatchlistStore::load_default() {
        Ok(watchlist) => watchlist,
        Err(e) => {
            eprintln!("Error opening watchlist: {}", e);
            std::process::exit(1);
        }
    };
    let notes = match Notes::load_default() {
        Ok(notes) => notes,
        Err(e) => {
            eprintln!("Error opening notes: {}", e);
            std::process::exit(1);
        }
    };

    let app = TuiApp::new(config, client, watchlist, session, notes, logs);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {}", e);
        std::process::exit(1);
    }
}
