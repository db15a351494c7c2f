fn main() {
    let profiling = std::env::var_os("CARGO_FEATURE_PROFILING").is_some();
    let tokio_unstable = std::env::var_os("CARGO_CFG_TOKIO_UNSTABLE").is_some();

    if profiling && !tokio_unstable {
        println!(
            "cargo:warning=modhub-logger `profiling` needs `--cfg tokio_unstable` \
             (export RUSTFLAGS=\"--cfg tokio_unstable\") to attach tokio-console"
        );
    }

    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PROFILING");
    println!("cargo:rerun-if-env-changed=CARGO_CFG_TOKIO_UNSTABLE");
}
