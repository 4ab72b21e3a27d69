//
// main.rs - Loopback Demo for the Socket/Event Layer
//
// Purpose:
//   Drives the whole layer through one worker loop against the simulated
//   engine: configure an interface, initialize the stack, connect a TCP
//   socket, and multiplex readiness until shutdown is requested.
//

use anyhow::Result;
use mtcp_socket::{
    DpdkConfig, EV_IN, EV_OUT, EventQueue, Stack, connect_ipv4, create_tcp_socket,
};
use nettest::SimStack;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let sim = Arc::new(SimStack::new());
    let peer = Ipv4Addr::new(10, 0, 0, 1);
    sim.add_peer(peer, 8080);

    let mut cfg = DpdkConfig::new();
    cfg.configure_interface(
        0,
        Ipv4Addr::new(10, 0, 0, 2),
        Ipv4Addr::new(255, 255, 255, 0),
        0,
    )?;

    let stack = Stack::init(sim.clone(), &cfg)?;
    let token = stack.shutdown_token();

    let ctx = stack.create_context(0)?;
    let sock = connect_ipv4(&ctx, create_tcp_socket(&ctx)?, peer, 8080)?;
    log::info!("connected socket {sock} to {peer}:8080");

    let mut queue = EventQueue::new(&ctx, 8)?;
    queue.add_socket(sock, EV_IN | EV_OUT)?;

    // the "peer" sends something shortly after the loop starts waiting
    let pusher = {
        let sim = sim.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            sim.trigger(sock, EV_IN);
        })
    };

    let mut batches = 0;
    while token.should_run() {
        let events = queue.wait(Some(Duration::from_millis(200)))?;
        for ev in events {
            log::info!(
                "socket {} ready: readable={} writable={}",
                ev.sockid,
                ev.readable(),
                ev.writable()
            );
        }
        batches += 1;
        if batches >= 3 {
            token.request();
        }
    }
    pusher.join().expect("pusher thread panicked");
    log::info!("shutdown requested, worker loop exited");
    Ok(())
}
