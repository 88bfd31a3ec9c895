//! # Certificate Demo
//!
//! Demonstrates an authority granting write access to its inbox.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example certificate_demo
//! ```

use sea_core::{CertifyOptions, Sea};
use serde_json::json;

#[tokio::main]
async fn main() {
    println!("=== SEA Core: Certificate Demo ===\n");

    let sea = Sea::new();
    let authority = sea.pair().await.expect("Failed to create authority");
    let alice = sea.pair().await.expect("Failed to create Alice");
    let bob = sea.pair().await.expect("Failed to create Bob");

    // Step 1: Everyone may write to the inbox
    println!("Step 1: Certifying everyone for 'inbox'...");
    let open = sea
        .certify(&json!("*"), &json!({"write": "inbox"}), &authority, &CertifyOptions::default())
        .await
        .expect("Failed to certify");
    println!("  Certificate: {}", open);
    println!();

    // Step 2: Only Alice, for an hour
    println!("Step 2: Certifying only Alice, expiring in one hour...");
    let expiry = chrono::Utc::now().timestamp() as f64 + 3600.0;
    let options = CertifyOptions {
        expiry: Some(expiry),
        block: Some(json!("blocked")),
    };
    let scoped = sea
        .certify(&json!([alice.public()]), &json!("inbox"), &authority, &options)
        .await
        .expect("Failed to certify");
    println!("  Certificate: {}", scoped);
    println!();

    // Step 3: Check it
    println!("Step 3: Reading the certificate back...");
    let cert = sea
        .verify_certificate(scoped, &authority.pub_key)
        .await
        .expect("Certificate did not verify");
    println!("  Grants Alice: {}", cert.grants(&alice.pub_key));
    println!("  Grants Bob:   {}", cert.grants(&bob.pub_key));
    println!("  Expired:      {}", cert.is_expired());
    println!();

    // Step 4: Trust is positional
    println!("Step 4: Note on trust");
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │ The certificate does not name its authority. It only       │");
    println!("  │ counts once stored under the authority's own namespace.    │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    println!("=== Example Complete ===");
}
