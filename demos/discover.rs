use eks_holmes::decode;
use eks_holmes::extract_issuer_info;
use eks_holmes::extract_subject_info;
use eks_holmes::incluster;
use eks_holmes::EndpointProber;
use eks_holmes::ProberConfig;
use eks_holmes::Settings;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example 1: Read the mounted token and inspect its claims
    println!("=== Example 1: Token Claims ===");
    let settings = Settings::from_env();
    let token = incluster::read_token(&settings.token_path)?;
    let claims = decode(&token)?;

    let location = extract_issuer_info(&claims.payload)?;
    println!("  Cluster ID: {}", location.cluster_id);
    println!("  Region: {}", location.region);

    match extract_subject_info(&claims.payload) {
        Ok(identity) => {
            println!("  Service Account: {}", identity.service_account);
            println!("  Namespace: {}", identity.namespace);
        }
        Err(e) => eprintln!("✗ Not a service account token: {}", e),
    }

    println!();

    // Example 2: Discover the API server with a tighter budget
    println!("=== Example 2: Endpoint Discovery ===");
    let config = ProberConfig::new()
        .with_timeout(Duration::from_secs(3))
        .with_delay(Duration::from_millis(50));
    let prober = EndpointProber::new(config)?;

    match prober.discover(&location).await {
        Ok(endpoint) => {
            println!("✓ API server: {}", endpoint.url);
            println!("  Status: {}", endpoint.status.as_u16());
            println!("  Attempts: {}", endpoint.attempts);
        }
        Err(e) => eprintln!("✗ Discovery failed: {}", e),
    }

    Ok(())
}
