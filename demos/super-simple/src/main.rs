use std::collections::HashMap;
use anyhow::{anyhow, Context};
use distvec::concepts::neighbour::PeerKind;
use distvec::concepts::packet::{DataPacket, OutboundPacket, Packet};
use distvec::framework::RoutingSystem;
use distvec::router::Router;
use log::{info, LevelFilter};
use simplelog::{Config, SimpleLogger};

struct SimpleExample {} // just a type to inform distvec of your network parameters
impl RoutingSystem for SimpleExample {
    type NodeAddress = String; // our nodes have string names
    type Port = u8;
}

/// (node, port) -> (node, port)
type Wiring = HashMap<(String, u8), (String, u8)>;

fn connect(nodes: &mut HashMap<String, Router<SimpleExample>>, wiring: &mut Wiring, a: (&str, u8), b: (&str, u8)) {
    wiring.insert((a.0.to_string(), a.1), (b.0.to_string(), b.1));
    wiring.insert((b.0.to_string(), b.1), (a.0.to_string(), a.1));
    for ((me, port), (other, _)) in [(a, b), (b, a)] {
        let kind = if nodes.contains_key(other) { PeerKind::Router } else { PeerKind::Host };
        if let Some(router) = nodes.get_mut(me) {
            router.handle_packet(
                &Packet::Discovery {
                    peer: other.to_string(),
                    kind,
                    link_up: true,
                },
                port,
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::init(LevelFilter::Info, Config::default())?;

    // we have the following connection: bob <-> eve <-> alice <-> laptop (a host)
    let mut nodes: HashMap<String, Router<SimpleExample>> = ["bob", "eve", "alice"]
        .into_iter()
        .map(|name| (name.to_string(), Router::new(name.to_string())))
        .collect();
    let mut wiring = Wiring::new();
    connect(&mut nodes, &mut wiring, ("bob", 1), ("eve", 1));
    connect(&mut nodes, &mut wiring, ("eve", 2), ("alice", 1));
    connect(&mut nodes, &mut wiring, ("alice", 2), ("laptop", 1));

    // bob sends a packet to the laptop once the routes have settled
    let mut pending = vec![(
        "bob".to_string(),
        1u8,
        Packet::Data(DataPacket {
            src: "bob".to_string(),
            dst: "laptop".to_string(),
            ttl: 8,
            payload: b"hi laptop".to_vec(),
        }),
    )];
    let mut delivered = false;

    // lets simulate routing!
    for step in 0..8 {
        // collect all of our packets, if any
        let mut packets = Vec::new();
        for (name, node) in nodes.iter_mut() {
            for OutboundPacket { port, packet } in node.outbound_packets.drain(..) {
                let (dest, arrival) = wiring
                    .get(&(name.clone(), port))
                    .with_context(|| format!("{name} sent out of unwired port {port}"))?;
                packets.push((dest.clone(), *arrival, packet));
            }
        }
        if step == 3 {
            packets.append(&mut pending);
        }

        for (dest, port, packet) in packets {
            match nodes.get_mut(&dest) {
                Some(node) => node.handle_packet(&packet, port),
                None => {
                    if let Packet::Data(data) = packet {
                        info!("{dest} received {:?} from {}", String::from_utf8_lossy(&data.payload), data.src);
                        delivered = true;
                    }
                }
            }
        }

        // lets observe bob's forwarding table:
        info!("Bob's routes in step {step}:");
        let bob = &nodes["bob"];
        let mut routes: Vec<_> = bob.routes.iter().collect();
        routes.sort_by(|a, b| a.0.cmp(b.0));
        for (dest, route) in routes {
            info!(" - {dest}: distance: {}, port: {}", route.distance, route.port);
        }
    }

    if !delivered {
        return Err(anyhow!("the laptop never got its packet"));
    }
    Ok(())
}
