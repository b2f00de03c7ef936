#![allow(dead_code)]

use conduit::{Conduit, SyncConduit};
use tokio::sync::mpsc::UnboundedSender;

// ============================================================================
// Test Contexts
// ============================================================================

#[derive(Debug, Default, PartialEq)]
pub struct Greeter {
    pub name: String,
}

pub fn greeter(name: &str) -> Greeter {
    Greeter { name: name.into() }
}

// ============================================================================
// Test Targets
// ============================================================================

/// Arguments of the callback-style target: the message and where to send
/// the greeting.
pub type Callback = (String, UnboundedSender<String>);

/// Greets `msg` on behalf of the context, returning the greeting.
pub fn do_stuff() -> SyncConduit<Greeter, String, String> {
    SyncConduit::builder()
        .target(|ctx: &Greeter, msg: String| Ok(format!("Hi, {} - {}", ctx.name, msg)))
        .context(greeter("Jimbabwe"))
        .build()
        .unwrap()
}

/// Greets `msg` on behalf of the context, sending the greeting to the reply
/// channel.
pub fn do_stuff_cb() -> Conduit<Greeter, Callback> {
    Conduit::builder()
        .target(|ctx: &Greeter, (msg, reply): Callback| {
            reply.send(format!("Hi, {} - {}", ctx.name, msg))?;
            Ok(())
        })
        .context(greeter("Jimbabwe"))
        .build()
        .unwrap()
}
