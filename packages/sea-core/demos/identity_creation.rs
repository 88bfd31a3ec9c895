//! # Identity Creation Example
//!
//! Demonstrates generating an identity, sharing its public half and
//! computing its key id.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example identity_creation
//! ```

use sea_core::Sea;

#[tokio::main]
async fn main() {
    println!("=== SEA Core: Identity Creation Example ===\n");

    let sea = Sea::new();

    // Step 1: Create a new identity
    println!("Step 1: Creating new identity...");
    let alice = sea.pair().await.expect("Failed to create identity");

    println!("  Identity created successfully!");
    println!("  Signing key (pub):     {}", alice.pub_key);
    println!("  Encryption key (epub): {}", alice.epub.as_deref().unwrap_or("-"));
    println!();

    // Step 2: Explain what must stay private
    println!("Step 2: Private halves");
    println!("  ┌────────────────────────────────────────────────────────┐");
    println!("  │ SECURITY WARNING: priv and epriv never leave this     │");
    println!("  │ device. Share only pub and epub.                      │");
    println!("  └────────────────────────────────────────────────────────┘");
    println!();

    // Step 3: Share the public half
    println!("Step 3: Public identity (safe to publish)...");
    let public = serde_json::to_string_pretty(&alice.public()).expect("Failed to serialize");
    for line in public.lines() {
        println!("  {}", line);
    }
    println!();

    // Step 4: Key id
    println!("Step 4: Key id (OpenPGP-style fingerprint)...");
    let id = sea.keyid(&alice.pub_key).expect("Failed to compute key id");
    println!("  Key id: {}", id);
    println!();

    // Step 5: Every identity is different
    println!("Step 5: Creating a second identity...");
    let bob = sea.pair().await.expect("Failed to create identity");
    let bob_id = sea.keyid(&bob.pub_key).expect("Failed to compute key id");
    println!("  Bob's key id: {}", bob_id);
    println!(
        "  Distinct: {}",
        if bob_id != id { "[OK]" } else { "[FAILED]" }
    );
    println!();

    println!("=== Example Complete ===");
}
