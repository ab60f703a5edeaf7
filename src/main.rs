use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use ecsprobe::runner::{self, RunConfig};
use ecsprobe::subnet::{Subnet, default_subnets};

#[derive(Parser)]
#[command(name = "ecsprobe")]
#[command(about = "EDNS Client Subnet support checker", long_about = None)]
struct Args {
    /// Domain list, one name per line
    input: PathBuf,

    /// Destination for the semicolon-delimited report
    output: PathBuf,

    /// Upstream DNS server (host:port)
    #[arg(short, long, default_value = "8.8.8.8:53")]
    upstream: SocketAddr,

    /// Client subnet to probe from, in CIDR notation (repeatable)
    #[arg(short, long = "subnet", value_name = "CIDR", default_values_t = default_subnets())]
    subnets: Vec<Subnet>,

    /// Per-query timeout in seconds
    #[arg(long, default_value = "5", value_name = "SECS")]
    timeout: u64,

    /// Log each probe
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let config = RunConfig {
        input: args.input,
        output: args.output,
        upstream: args.upstream,
        subnets: args.subnets,
        timeout: Duration::from_secs(args.timeout),
        verbose: args.verbose,
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("cannot start runtime: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(runner::run(config)) {
        eprintln!("{e}");
        process::exit(1);
    }
}
