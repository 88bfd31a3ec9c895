//! # Encryption Demo
//!
//! Demonstrates encrypting for yourself, for a passphrase, and for another
//! identity through an ECDH shared secret.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use sea_core::{CipherOptions, Sea};
use serde_json::json;

#[tokio::main]
async fn main() {
    println!("=== SEA Core: Encryption Demo ===\n");

    let sea = Sea::new();
    let opts = CipherOptions::default();

    let alice = sea.pair().await.expect("Failed to create Alice");
    let bob = sea.pair().await.expect("Failed to create Bob");

    // Step 1: Encrypt for yourself
    println!("Step 1: Encrypting with Alice's own key...");
    let sealed = sea
        .encrypt("my diary", &alice, &opts)
        .await
        .expect("Failed to encrypt");
    println!("  Envelope: {}", sealed);
    let plain = sea
        .decrypt(sealed, &alice, &opts)
        .await
        .expect("Failed to decrypt");
    println!("  Decrypted: {}", plain);
    println!();

    // Step 2: Shared secret
    println!("Step 2: Deriving a shared secret...");
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │  Alice.epriv × Bob.epub  ==  Bob.epriv × Alice.epub        │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    let alice_side = sea
        .secret(bob.epub.as_deref().unwrap_or_default(), Some(&alice))
        .await
        .expect("Failed to derive secret");
    let bob_side = sea
        .secret(alice.epub.as_deref().unwrap_or_default(), Some(&bob))
        .await
        .expect("Failed to derive secret");
    println!(
        "  Both sides agree: {}",
        if alice_side == bob_side { "[OK]" } else { "[FAILED]" }
    );
    println!();

    // Step 3: Message for Bob
    println!("Step 3: Alice encrypts a message for Bob...");
    let message = json!({"text": "Meet at noon", "from": alice.pub_key});
    let sealed = sea
        .encrypt(message, &alice_side, &opts)
        .await
        .expect("Failed to encrypt");
    let opened = sea
        .decrypt(sealed, &bob_side, &opts)
        .await
        .expect("Failed to decrypt");
    println!("  Bob reads: {}", opened);
    println!();

    // Step 4: Wrong key
    println!("Step 4: Decrypting with the wrong passphrase...");
    let sealed = sea
        .encrypt("classified", "correct horse", &opts)
        .await
        .expect("Failed to encrypt");
    match sea.decrypt(sealed, "battery staple", &opts).await {
        Ok(_) => println!("  [FAILED] Wrong key was accepted!"),
        Err(e) => println!("  [OK] Rejected: {}", e),
    }
    println!();

    println!("=== Example Complete ===");
}
