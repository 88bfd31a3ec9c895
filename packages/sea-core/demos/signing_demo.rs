//! # Digital Signature Demo
//!
//! Demonstrates ECDSA P-256 signatures over SEA envelopes.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use sea_core::{is_tagged, Sea};
use serde_json::json;

#[tokio::main]
async fn main() {
    println!("=== SEA Core: Digital Signature Demo ===\n");

    let sea = Sea::new();

    // Step 1: Create an identity
    println!("Step 1: Creating identity...");
    let alice = sea.pair().await.expect("Failed to create identity");
    println!("  Public key: {}", alice.pub_key);
    println!();

    // Step 2: Explain the signing process
    println!("Step 2: Understanding SEA Signatures");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                   SIGNATURE FLOW                            │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │  SIGNING (Private Key Holder Only):                        │");
    println!("  │                                                             │");
    println!("  │    Payload ─► serialize ─► SHA-256 ──┐                     │");
    println!("  │                                      ▼                     │");
    println!("  │    priv ───────────────────────► ECDSA P-256 ─► s          │");
    println!("  │                                                             │");
    println!("  │    Output: SEA{{\"m\": payload, \"s\": base64(s)}}             │");
    println!("  │                                                             │");
    println!("  │  VERIFICATION (Anyone with pub):                           │");
    println!("  │                                                             │");
    println!("  │    m, s, pub ─► ECDSA verify ─► payload / mismatch         │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 3: Sign a payload
    println!("Step 3: Signing a payload...");
    let payload = json!({"hello": "world"});
    let signed = sea.sign(payload.clone(), &alice).await.expect("Failed to sign");
    println!("  Payload: {}", payload);
    println!("  Signed:  {}", signed);
    println!("  Tagged:  {}", is_tagged(&signed));
    println!();

    // Step 4: Verify the signature
    println!("Step 4: Verifying the signature...");
    match sea.verify(signed.clone(), &alice.pub_key).await {
        Ok(message) => println!("  [OK] Signature is valid! Message: {}", message),
        Err(e) => println!("  [FAILED] Signature verification failed: {}", e),
    }
    println!();

    // Step 5: Demonstrate forgery detection
    println!("Step 5: Forgery detection...");
    let tampered = signed.replacen("world", "w0rld", 1);
    match sea.verify(tampered, &alice.pub_key).await {
        Ok(_) => println!("  [FAILED] Tampered message was accepted!"),
        Err(e) => println!("  [OK] Tampered message detected: {}", e),
    }

    let mallory = sea.pair().await.expect("Failed to create identity");
    match sea.verify(signed, &mallory.pub_key).await {
        Ok(_) => println!("  [FAILED] Wrong public key was accepted!"),
        Err(e) => println!("  [OK] Wrong public key detected: {}", e),
    }
    println!("  Last error on context: {:?}", sea.last_error());
    println!();

    println!("=== Example Complete ===");
}
