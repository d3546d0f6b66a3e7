//! Tail a logcat stream with an optional filter
//!
//! Run with: cargo run --example tail [--dummy | --file PATH] [FILTER]
//!
//! Examples:
//!   cargo run --example tail                                  # live device via adb
//!   cargo run --example tail -- 'level >= 5'                  # warnings and up
//!   cargo run --example tail -- --dummy 'tag =~ "dummy"'      # synthetic source
//!   cargo run --example tail -- --file dump.bin 'pid == 42'   # saved `logcat -B` output
//!
//! The default source runs `adb exec-out logcat -B` and needs a device
//! attached. Process names are looked up with `adb shell cat /proc/<pid>/cmdline`.
//!
//! Set RUST_LOG to change log verbosity (e.g. RUST_LOG=logcat_rs=trace).

use std::process::{Child, Command, Stdio};

use logcat_rs::{AsyncChannel, Backend, DeviceBackend, DummyConfig, Filter, Session};

enum Source {
    Device,
    Dummy,
    File(String),
}

fn print_usage() {
    eprintln!("Usage: tail [--dummy | --file PATH] [FILTER]");
    eprintln!();
    eprintln!("Filter examples:");
    eprintln!("  tail 'level >= 5'");
    eprintln!("  tail 'tag == \"ActivityManager\" && pid != 1'");
    eprintln!("  tail 'text =~ \"^Start.*\" || pname !~ \"system\"'");
}

fn parse_args(args: &[String]) -> Result<(Source, String), String> {
    let mut source = Source::Device;
    let mut filter = None;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dummy" => source = Source::Dummy,
            "--file" => {
                let path = iter.next().ok_or("--file needs a path")?;
                source = Source::File(path.clone());
            }
            _ if filter.is_none() => filter = Some(arg.clone()),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }

    Ok((source, filter.unwrap_or_default()))
}

/// Read a process name from the device, empty when it cannot be found
fn device_pname(pid: i32) -> Option<String> {
    let output = Command::new("adb")
        .args(["shell", "cat", &format!("/proc/{}/cmdline", pid)])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let name = output.stdout.split(|&b| b == 0).next()?;
    let name = String::from_utf8_lossy(name).trim().to_string();
    (!name.is_empty()).then_some(name)
}

fn open_device() -> std::io::Result<(Backend, Child)> {
    let mut child = Command::new("adb")
        .args(["exec-out", "logcat", "-B"])
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("adb stdout not captured"))?;

    let backend = DeviceBackend::new(stdout).with_resolver(device_pname);
    Ok((backend.into(), child))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let (source, expression) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("logcat_rs=info".parse()?)
                .add_directive("tail=info".parse()?),
        )
        .init();

    let filter = match Filter::new(&expression) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid filter {:?}: {}", expression, e);
            std::process::exit(2);
        }
    };

    let mut child = None;
    let backend = match source {
        Source::Device => {
            let (backend, adb) = open_device()?;
            child = Some(adb);
            backend
        }
        Source::Dummy => Backend::dummy(DummyConfig::default()),
        Source::File(path) => Backend::file(path)?,
    };

    let session = Session::new(backend);
    session.start()?;
    tracing::info!(session_id = session.id(), filter = %filter, "Tailing");

    let (channel, mut messages) = AsyncChannel::open(&session, filter, 256)?;
    let mut printed = 0u64;

    loop {
        tokio::select! {
            msg = messages.recv() => match msg {
                Some(msg) => {
                    println!("{:>8} {}", msg.pname, msg);
                    printed += 1;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
        }
    }

    // Ending the adb process unblocks the writer so the session can join it
    if let Some(mut adb) = child {
        let _ = adb.kill();
        let _ = adb.wait();
    }

    drop(messages);
    channel.close();

    let stats = session.stats();
    eprintln!(
        "Printed {} messages ({} received, {} evicted, {:.1}% of buffer in use)",
        printed,
        stats.records_written,
        stats.records_evicted,
        stats.utilization()
    );
    session.destroy();

    Ok(())
}
