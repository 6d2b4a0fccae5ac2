#[cfg(feature = "json")]
use duptree::JsonReportSink;
use duptree::{CoreError, Scanner, Session, TextListener, TextReportSink, TreeMerger};
use getopts::Options;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

enum OutputMode {
    Text,
    Json,
}

static CTRL_C_BREAKS: AtomicU32 = AtomicU32::new(0);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut opts = Options::new();
    opts.optflag("s", "small", "Also hash small files (smaller than a disk block)");
    opts.optflag("q", "quiet", "Hide scan progress output");
    opts.optmulti("e", "exclude", "Don't scan directories or files with this exact name", "<name>");
    opts.optflag("", "json", "Emit duplicate-directory groups as JSON");
    opts.optflag("h", "help", "This help text");

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());

    let matches = match opts.parse(args) {
        Ok(m) => m,
        Err(err) => {
            writeln!(io::stderr(), "{}", err).ok();
            std::process::exit(2);
        }
    };

    if matches.opt_present("h") || matches.free.is_empty() {
        println!(
            "Find whole-directory duplicates (v{}).\n{}\n\n{}",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_HOMEPAGE"),
            opts.usage(&(opts.short_usage(&program) + " <files or directories>"))
        );
        return;
    }

    let output_mode = if matches.opt_present("json") { OutputMode::Json } else { OutputMode::Text };

    ctrlc::set_handler(move || {
        CTRL_C_BREAKS.fetch_add(1, Ordering::SeqCst);
    })
    .ok();

    let mut scanner = Scanner::new();
    scanner.settings.ignore_small = !matches.opt_present("small");
    scanner.settings.break_on = Some(&CTRL_C_BREAKS);
    scanner.exclude(matches.opt_strs("exclude"));
    if !matches.opt_present("quiet") {
        scanner.set_listener(Box::new(TextListener::new()));
    }

    if let Err(err) = run(scanner, matches.free, output_mode) {
        writeln!(io::stderr(), "Error: {}", err).ok();
        std::process::exit(1);
    }
}

fn run(mut scanner: Scanner, paths: Vec<String>, output_mode: OutputMode) -> Result<(), CoreError> {
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    for path in &paths {
        scanner.enqueue(path)?;
    }
    scanner.flush()?;

    let session = Session::new(paths.iter().map(|p| p.canonicalize().unwrap_or_else(|_| p.clone())).collect());
    let mut merger = TreeMerger::new(&session);
    if !merger.count_pass_complete() {
        tracing::warn!("file-count pass did not complete cleanly; some directories may be under-counted");
    }

    for file in scanner.matched_files() {
        if let Err(err) = merger.feed(&file) {
            tracing::error!(%err, "skipping invalid matched file");
        }
    }

    match output_mode {
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut sink = TextReportSink::new(stdout.lock());
            merger.finish(&mut sink);
        }
        OutputMode::Json => {
            #[cfg(feature = "json")]
            {
                let mut sink = JsonReportSink::new();
                merger.finish(&mut sink);
                match sink.to_json_string() {
                    Ok(json) => println!("{}", json),
                    Err(err) => {
                        writeln!(io::stderr(), "failed to serialize JSON: {}", err).ok();
                        std::process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                writeln!(io::stderr(), "This binary was compiled without JSON support.").ok();
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
