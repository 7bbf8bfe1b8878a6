use std::env;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use eks_holmes::workflow;
use eks_holmes::CancellationToken;
use eks_holmes::EndpointProber;
use eks_holmes::ProbeProgress;
use eks_holmes::Settings;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const GOODBYE: &str = "\nG00dBye!";
/// Conventional exit status after SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

const BANNER: &str = r"
  ___ _  _____   _  _      _
 | __| |/ / __| | || |___ | |_ __  ___ ___
 | _|| ' <\__ \ | __ / _ \| | '  \/ -_|_-<
 |___|_|\_\___/ |_||_\___/|_|_|_|_\___/__/
";

/// Terminal styling, switched off by `NO_COLOR`
struct Palette {
    enabled: bool,
}

impl Palette {
    const GREEN: &'static str = "\x1b[1;32m";
    const BLUE: &'static str = "\x1b[1;34m";
    const PURPLE: &'static str = "\x1b[1;35m";
    const RED: &'static str = "\x1b[1;31m";
    const RESET: &'static str = "\x1b[0m";

    fn from_env() -> Self {
        Self {
            enabled: env::var_os("NO_COLOR").map_or(true, |value| value.is_empty()),
        }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.enabled {
            format!("{color}{text}{}", Self::RESET)
        } else {
            text.to_string()
        }
    }

    fn ok(&self, text: &str) -> String {
        self.paint(text, Self::GREEN)
    }

    fn menu(&self, text: &str) -> String {
        self.paint(text, Self::BLUE)
    }

    fn error(&self, text: &str) -> String {
        self.paint(text, Self::RED)
    }
}

enum Choice {
    Enumerate,
    Generate,
    Exit,
}

/// What a Ctrl-C did
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// The running operation was cancelled; the menu comes back
    Cancelled,
    /// No operation was running; the process ends
    Exit,
}

/// Routes Ctrl-C to the running operation, or ends the process when idle
///
/// Once tokio listens for SIGINT the default handler is gone for the whole
/// process, so a single listener lives for as long as the menu does.
#[derive(Clone, Default)]
struct Interrupts {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Register a new operation and hand out its cancellation token
    fn begin(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        *self.slot() = Some(cancel.clone());
        cancel
    }

    /// Mark the running operation as done
    fn finish(&self) {
        self.slot().take();
    }

    fn interrupt(&self) -> Interrupt {
        match self.slot().take() {
            Some(cancel) => {
                cancel.cancel();
                Interrupt::Cancelled
            }
            None => Interrupt::Exit,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the process-wide Ctrl-C listener
    fn listen(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    warn!(%error, "Failed to listen for Ctrl-C");
                    return;
                }
                match interrupts.interrupt() {
                    Interrupt::Cancelled => debug!("Cancelled running operation"),
                    Interrupt::Exit => {
                        println!("{GOODBYE}");
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let palette = Palette::from_env();
    let settings = Settings::from_env();
    let prober = EndpointProber::new(settings.prober.clone())?;

    let interrupts = Interrupts::default();
    let listener = interrupts.listen();

    println!("{}", palette.paint(BANNER, Palette::PURPLE));
    println!("    Version: {}\n", env!("CARGO_PKG_VERSION"));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_menu(&palette)?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };

        match parse_choice(&line) {
            Some(Choice::Enumerate) => {
                run_cancellable(&interrupts, |cancel| enumerate(&settings, &prober, &palette, cancel)).await
            }
            Some(Choice::Generate) => {
                run_cancellable(&interrupts, |cancel| generate(&settings, &prober, &palette, cancel)).await
            }
            Some(Choice::Exit) => break,
            None => println!(
                "{}",
                palette.error(&format!("\n[X] Invalid option: {}. Please try again.", line.trim()))
            ),
        }

        println!("{}", palette.menu("\n[+] Press Enter to continue..."));
        if lines.next().transpose()?.is_none() {
            break;
        }
    }

    listener.abort();
    println!("{GOODBYE}");
    Ok(())
}

fn print_menu(palette: &Palette) -> io::Result<()> {
    println!("{}", palette.menu("1. EKS API Server Enumeration"));
    println!("{}", palette.menu("2. Generate Kubeconfig"));
    println!("{}", palette.menu("0. Exit"));
    print!("{}", palette.menu("\nSelect an option: "));
    io::stdout().flush()
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim().parse::<u8>().ok()? {
        1 => Some(Choice::Enumerate),
        2 => Some(Choice::Generate),
        0 => Some(Choice::Exit),
        _ => None,
    }
}

/// Run one operation, cancelling it on Ctrl-C
async fn run_cancellable<F, Fut>(interrupts: &Interrupts, operation: F)
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    operation(interrupts.begin()).await;
    interrupts.finish();
}

fn progress_printer(palette: &Palette) -> impl FnMut(&ProbeProgress) + '_ {
    move |progress| {
        if progress.index == 0 {
            print!("\n[+] Progress: ");
        }
        if progress.index % 10 == 0 {
            print!("[{}/{}]", progress.index + 1, progress.total);
        } else {
            print!(".");
        }
        if progress.outcome.is_live() {
            println!("\n[✓] Found valid endpoint: {}", palette.ok(&progress.url));
        } else if progress.index + 1 == progress.total {
            println!();
        }
        if let Err(error) = io::stdout().flush() {
            debug!(%error, "Failed to flush progress output");
        }
    }
}

async fn enumerate(
    settings: &Settings,
    prober: &EndpointProber,
    palette: &Palette,
    cancel: CancellationToken,
) {
    println!(
        "\n[+] Enumerating EKS endpoint ({} candidates)...",
        prober.candidate_count()
    );

    match workflow::enumerate_endpoint(settings, prober, progress_printer(palette), &cancel).await
    {
        Ok(found) => {
            println!("[✓] Cluster ID: {}", palette.ok(&found.location.cluster_id));
            println!("[✓] Region: {}", palette.ok(&found.location.region));
            println!(
                "[✓] EKS API Server: {} (Status: {})",
                palette.ok(&found.endpoint.url),
                found.endpoint.status.as_u16()
            );
        }
        Err(error) => println!("{}", palette.error(&format!("\n[X] Enumeration failed: {error}"))),
    }
}

async fn generate(
    settings: &Settings,
    prober: &EndpointProber,
    palette: &Palette,
    cancel: CancellationToken,
) {
    match workflow::generate_kubeconfig(settings, prober, progress_printer(palette), &cancel).await
    {
        Ok(generated) => {
            println!(
                "[✓] Service Account: {}",
                generated.identity.service_account
            );
            println!("[✓] Namespace: {}", generated.identity.namespace);
            println!("[✓] EKS API Server: {}", palette.ok(&generated.endpoint.url));
            println!(
                "[✓] Kubeconfig generated successfully: {}",
                palette.ok(&generated.path.display().to_string())
            );
        }
        Err(error) => println!(
            "{}",
            palette.error(&format!("\n[X] Kubeconfig generation failed: {error}"))
        ),
    }
}
