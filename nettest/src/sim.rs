//
// sim.rs - Simulated Kernel-Bypass Stack
//
// Purpose:
//   In-memory implementation of the StackDriver seam. It gives tests and
//   demos a controllable engine: peers are scripted with add_peer, and
//   readiness is injected with trigger, standing in for packets arriving
//   on a real poll-mode NIC.
//
// How it works:
//   - Contexts, sockets, and readiness descriptors are table-allocated ids
//     behind one mutex; a condvar wakes blocked waits when readiness is
//     injected from another thread.
//   - Readiness is level-triggered: a pending condition stays visible to
//     every wait until the test clears it by other means (closing the
//     context, deregistering the socket).
//   - Waits park in short slices so a registered shutdown token is
//     observed promptly even while blocked, matching the engine contract
//     that a shutdown request makes a pending wait return early.
//

use mtcp_socket::config::DpdkConfig;
use mtcp_socket::driver::{EV_ERR, EV_HUP, EV_OUT, Event, StackDriver};
use mtcp_socket::shutdown::ShutdownToken;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

const PARK_SLICE: Duration = Duration::from_millis(10);

struct SocketState {
    ctx: i32,
    pending: u32,
}

struct EpollState {
    ctx: i32,
    interest: HashMap<i32, u32>,
}

#[derive(Default)]
struct Inner {
    config: Option<DpdkConfig>,
    shutdown: Option<ShutdownToken>,
    peers: Vec<(Ipv4Addr, u16)>,
    next_ctx: i32,
    next_sock: i32,
    next_ep: i32,
    contexts: HashMap<i32, usize>,
    sockets: HashMap<i32, SocketState>,
    epolls: HashMap<i32, EpollState>,
}

/// Simulated engine behind the `StackDriver` seam.
#[derive(Default)]
pub struct SimStack {
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl SimStack {
    pub fn new() -> Self {
        SimStack::default()
    }

    /// Scripts a listening peer; connects to any other address are refused.
    pub fn add_peer(&self, ip: Ipv4Addr, port: u16) {
        self.inner.lock().unwrap().peers.push((ip, port));
    }

    /// Injects readiness on `sockid`, as if the peer had acted. Wakes any
    /// blocked wait.
    pub fn trigger(&self, sockid: i32, events: u32) {
        let mut inner = self.inner.lock().unwrap();
        let socket = inner
            .sockets
            .get_mut(&sockid)
            .expect("trigger on unknown socket");
        socket.pending |= events;
        self.ready.notify_all();
    }
}

impl StackDriver for SimStack {
    fn init(&self, cfg: &DpdkConfig) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if inner.config.is_some() {
            return -libc::EALREADY;
        }
        if cfg.configured_interfaces() == 0 {
            return -libc::EINVAL;
        }
        inner.config = Some(cfg.clone());
        0
    }

    fn register_shutdown(&self, token: &ShutdownToken) {
        self.inner.lock().unwrap().shutdown = Some(token.clone());
    }

    fn create_context(&self, core: usize) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        let Some(config) = inner.config.as_ref() else {
            return -libc::EINVAL;
        };
        if core >= config.num_cores {
            return -libc::EINVAL;
        }
        let ctx = inner.next_ctx;
        inner.next_ctx += 1;
        inner.contexts.insert(ctx, core);
        ctx
    }

    fn destroy_context(&self, ctx: i32) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if inner.contexts.remove(&ctx).is_none() {
            return -libc::EINVAL;
        }
        inner.sockets.retain(|_, s| s.ctx != ctx);
        inner.epolls.retain(|_, e| e.ctx != ctx);
        0
    }

    fn tcp_socket(&self, ctx: i32) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if !inner.contexts.contains_key(&ctx) {
            return -libc::EINVAL;
        }
        let sockid = inner.next_sock;
        inner.next_sock += 1;
        inner.sockets.insert(sockid, SocketState { ctx, pending: 0 });
        sockid
    }

    fn connect(&self, ctx: i32, sockid: i32, addr: libc::sockaddr_in) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if !inner.contexts.contains_key(&ctx) {
            return -libc::EINVAL;
        }
        let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
        let port = u16::from_be(addr.sin_port);
        if !inner.peers.contains(&(ip, port)) {
            log::debug!("refusing connect to unscripted peer {ip}:{port}");
            return -libc::ECONNREFUSED;
        }
        let Some(socket) = inner.sockets.get_mut(&sockid) else {
            return -libc::EBADF;
        };
        if socket.ctx != ctx {
            return -libc::EBADF;
        }
        socket.pending |= EV_OUT;
        self.ready.notify_all();
        0
    }

    fn epoll_create(&self, ctx: i32, _maxevents: usize) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if !inner.contexts.contains_key(&ctx) {
            return -libc::EINVAL;
        }
        let ep = inner.next_ep;
        inner.next_ep += 1;
        inner.epolls.insert(
            ep,
            EpollState {
                ctx,
                interest: HashMap::new(),
            },
        );
        ep
    }

    fn epoll_add(&self, ctx: i32, ep: i32, sockid: i32, events: u32) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if !inner.sockets.contains_key(&sockid) {
            return -libc::EBADF;
        }
        let Some(epoll) = inner.epolls.get_mut(&ep) else {
            return -libc::EBADF;
        };
        if epoll.ctx != ctx {
            return -libc::EINVAL;
        }
        if epoll.interest.contains_key(&sockid) {
            return -libc::EEXIST;
        }
        epoll.interest.insert(sockid, events);
        0
    }

    fn epoll_del(&self, ctx: i32, ep: i32, sockid: i32) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        let Some(epoll) = inner.epolls.get_mut(&ep) else {
            return -libc::EBADF;
        };
        if epoll.ctx != ctx {
            return -libc::EINVAL;
        }
        if epoll.interest.remove(&sockid).is_none() {
            return -libc::ENOENT;
        }
        0
    }

    fn epoll_wait(&self, ctx: i32, ep: i32, events: &mut [Event], timeout_ms: i32) -> i32 {
        let deadline =
            (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));
        let mut inner = self.inner.lock().unwrap();
        loop {
            let Some(epoll) = inner.epolls.get(&ep) else {
                return -libc::EBADF;
            };
            if epoll.ctx != ctx {
                return -libc::EINVAL;
            }
            let mut n = 0;
            for (&sockid, &interest) in &epoll.interest {
                if n == events.len() {
                    break;
                }
                // a socket that vanished under a live registration reports an error condition
                let pending = inner
                    .sockets
                    .get(&sockid)
                    .map(|s| s.pending)
                    .unwrap_or(EV_ERR | EV_HUP);
                let fired = pending & (interest | EV_ERR | EV_HUP);
                if fired != 0 {
                    events[n] = Event::new(sockid, fired);
                    n += 1;
                }
            }
            if n > 0 {
                return n as i32;
            }
            if inner.shutdown.as_ref().is_some_and(|t| t.is_requested()) {
                return 0;
            }
            if timeout_ms == 0 {
                return 0;
            }
            let park = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return 0;
                    }
                    PARK_SLICE.min(d - now)
                }
                None => PARK_SLICE,
            };
            inner = self.ready.wait_timeout(inner, park).unwrap().0;
        }
    }

    fn epoll_close(&self, ctx: i32, ep: i32) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        let Some(epoll) = inner.epolls.get(&ep) else {
            return -libc::EBADF;
        };
        if epoll.ctx != ctx {
            return -libc::EINVAL;
        }
        inner.epolls.remove(&ep);
        0
    }
}
