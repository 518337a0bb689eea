#![cfg(not(tarpaulin_include))]

use funcplot::app::{Alert, PlotApp, SessionView};
use funcplot::client::{Backend, HttpBackend, load_translations};
use funcplot::config::Config;
use funcplot::graph::{ImageFormat, PlottersRenderer, Renderer};
use funcplot::i18n::Language;
use funcplot::keyboard::SHORTCUTS;
use std::env;
use std::io::{self, Write};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let s = Instant::now(); // Start time for the entire program
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [server_url]", args[0]);
        return Ok(());
    }

    let mut config = Config::from_env();
    if let Some(url) = args.get(1) {
        config = config.with_server_url(url.as_str());
    }

    let backend = HttpBackend::new(&config.server_url)?;
    let translations = load_translations(&backend).await;
    let mut app = PlotApp::new(backend, PlottersRenderer, translations, config);

    let mut status = match app.startup().await {
        Some(alert) => alert_status(&app, alert),
        None => String::from("ok"),
    };
    print_page(&app);

    let mut start_time = Instant::now(); // Start time for the first command
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();

        start_time = Instant::now(); // Reset the start time for the next command

        if line.is_empty() {
            status = String::from("invalid command");
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        status = String::from("ok");
        match command {
            "q" => break,
            "help" => print_help(),
            "expr" => app.expression.set_value(arg),
            "xmin" => app.xmin = arg.to_string(),
            "xmax" => app.xmax = arg.to_string(),
            "samples" => app.samples = arg.to_string(),
            "plot" => {
                if let Some(alert) = app.plot() {
                    status = alert_status(&app, alert);
                } else {
                    print_plot(&app);
                }
            }
            "pin" => match app.pin() {
                Some(alert) => status = alert_status(&app, alert),
                None => print_pinned(&app),
            },
            "unpin" => {
                if let Some(alert) = app.clear_pins() {
                    status = alert_status(&app, alert);
                }
            }
            "show" => print_page(&app),
            "save" => {
                let alert = app.save().await;
                status = alert_status(&app, alert);
            }
            "export" => {
                let path = if arg.is_empty() {
                    chrono::Local::now()
                        .format("plot-%Y%m%d-%H%M%S.png")
                        .to_string()
                } else {
                    arg.to_string()
                };
                status = match export(&app, &path) {
                    Ok(()) => format!("exported {}", path),
                    Err(e) => format!("export failed: {}", e),
                };
            }
            "user" => app.username = arg.to_string(),
            "pass" => app.password = arg.to_string(),
            "register" => {
                let alert = app.register().await;
                status = alert_status(&app, alert);
            }
            "login" => {
                let alert = app.login().await;
                status = alert_status(&app, alert);
            }
            "logout" => {
                if let Some(alert) = app.logout().await {
                    status = alert_status(&app, alert);
                }
            }
            "list" => {
                app.refresh_saved().await;
                print_saved(&app);
            }
            "lang" => match arg.parse::<Language>() {
                Ok(language) => {
                    app.set_language(language);
                    print_page(&app);
                }
                Err(e) => status = e,
            },
            "keys" => {
                for (i, key) in SHORTCUTS.iter().enumerate() {
                    println!("  {:>2}: {:?}", i, key);
                }
            }
            "key" => {
                let pressed = arg.parse::<usize>().is_ok_and(|index| app.press_key(index));
                if pressed {
                    println!("{}", app.expression.value());
                } else {
                    status = String::from("invalid key");
                }
            }
            "cursor" => match arg.parse::<usize>() {
                Ok(pos) => app.expression.set_cursor(pos),
                Err(_) => status = String::from("invalid position"),
            },
            _ => status = String::from("invalid command"),
        }
    }

    let e = s.elapsed().as_secs_f64(); // Calculate total elapsed time
    println!("Total elapsed time: {:.1} seconds", e);

    Ok(())
}

fn alert_status<B: Backend, R: Renderer>(app: &PlotApp<B, R>, alert: Alert) -> String {
    app.alert_text(alert).to_string()
}

fn export<B: Backend, R: Renderer>(
    app: &PlotApp<B, R>,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = app.rasterize_current(ImageFormat::Png)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  expr <text>: Set the expression");
    println!("  xmin <v>, xmax <v>: Set the domain (blank for the default)");
    println!("  samples <n>: Set the number of samples (blank for the default)");
    println!("  plot: Sample and plot the expression");
    println!("  pin: Keep the expression drawn on later plots");
    println!("  unpin: Remove every pinned expression");
    println!("  show: Show the page");
    println!("  save: Save the current plot on the server");
    println!("  export [path]: Write the current plot as a PNG file");
    println!("  user <name>, pass <password>: Fill in the credentials");
    println!("  register, login, logout: Manage the session");
    println!("  list: Reload and show the saved plots");
    println!("  lang <en|pt>: Switch the interface language");
    println!("  keys: List the virtual keyboard");
    println!("  key <n>: Press virtual key n");
    println!("  cursor <pos>: Move the expression cursor");
    println!("  q: Quit");
}

fn print_page<B: Backend, R: Renderer>(app: &PlotApp<B, R>) {
    println!("== {} ==", app.label("title", "Function Plotter"));
    match app.session() {
        SessionView::LoggedIn { username } => {
            println!("{} {}", app.label("logged_as", "Logged in as"), username)
        }
        SessionView::LoggedOut => println!("{}", app.label("not_logged", "Not logged in")),
    }
    println!("{}: {}", app.label("expression", "Expression"), app.expression.value());
    println!(
        "{}: {:?}  {}: {:?}  {}: {:?}",
        app.label("xmin", "x min"),
        app.xmin,
        app.label("xmax", "x max"),
        app.xmax,
        app.label("samples", "Samples"),
        app.samples
    );
    print_pinned(app);
    print_plot(app);
    print_saved(app);
}

fn print_pinned<B: Backend, R: Renderer>(app: &PlotApp<B, R>) {
    for line in app.pinned_lines() {
        println!("  {}", line);
    }
}

fn print_plot<B: Backend, R: Renderer>(app: &PlotApp<B, R>) {
    let Some(plot) = app.current_plot() else {
        println!("(no plot)");
        return;
    };
    let (x_range, y_range) = plot.axis_ranges();
    for trace in &plot.traces {
        println!(
            "{} points, {} unplottable",
            trace.series.len(),
            trace.series.unplottable_count()
        );
    }
    println!(
        "x in [{:.4}, {:.4}], y in [{:.4}, {:.4}]",
        x_range.start, x_range.end, y_range.start, y_range.end
    );
}

fn print_saved<B: Backend, R: Renderer>(app: &PlotApp<B, R>) {
    println!("{}:", app.label("saved_plots", "Saved plots"));
    for line in app.saved_lines() {
        println!("  {}", line);
    }
}
