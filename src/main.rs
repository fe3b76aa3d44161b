#[tokio::main]
async fn main() {
    let code = match wireshark_mcp::run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "wireshark-mcp failed");
            eprintln!("wireshark-mcp: {e:#}");
            1
        }
    };

    // A parked stdin read would otherwise hold up runtime teardown.
    std::process::exit(code);
}
