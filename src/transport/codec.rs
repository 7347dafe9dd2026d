//! OSC wire codec
//!
//! Converts between `Message` and OSC 1.0 packets. Inbound bundles are flattened
//! in order. `Bool` and `Double` are coerced to the scalar types we model; `Long`
//! is accepted when it fits an `i32`. Any other argument type rejects the packet.
use rosc::{decoder, encoder, OscMessage, OscPacket, OscType};

use crate::error::{LiveOscError, Result};
use crate::message::{Arg, Message};

pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: message.address.clone(),
        args: message.args.iter().map(to_osc_type).collect(),
    });
    Ok(encoder::encode(&packet)?)
}

/// Decode one datagram into the messages it carries
pub fn decode(datagram: &[u8]) -> Result<Vec<Message>> {
    let (_rest, packet) = decoder::decode_udp(datagram)?;
    let mut messages = Vec::new();
    flatten(packet, &mut messages)?;
    Ok(messages)
}

fn flatten(packet: OscPacket, messages: &mut Vec<Message>) -> Result<()> {
    match packet {
        OscPacket::Message(msg) => {
            let args = msg
                .args
                .into_iter()
                .map(from_osc_type)
                .collect::<Result<Vec<_>>>()
                .map_err(|e| LiveOscError::Codec(format!("{}: {}", msg.addr, e)))?;
            messages.push(Message::new(msg.addr, args));
        }
        OscPacket::Bundle(bundle) => {
            for packet in bundle.content {
                flatten(packet, messages)?;
            }
        }
    }
    Ok(())
}

fn to_osc_type(arg: &Arg) -> OscType {
    match arg {
        Arg::Int(v) => OscType::Int(*v),
        Arg::Float(v) => OscType::Float(*v),
        Arg::Str(v) => OscType::String(v.clone()),
    }
}

fn from_osc_type(value: OscType) -> Result<Arg> {
    match value {
        OscType::Int(v) => Ok(Arg::Int(v)),
        OscType::Float(v) => Ok(Arg::Float(v)),
        OscType::String(v) => Ok(Arg::Str(v)),
        OscType::Bool(v) => Ok(Arg::Int(i32::from(v))),
        OscType::Double(v) => Ok(Arg::Float(v as f32)),
        OscType::Long(v) => i32::try_from(v)
            .map(Arg::Int)
            .map_err(|_| LiveOscError::Codec(format!("integer {} out of range", v))),
        other => Err(LiveOscError::Codec(format!(
            "unsupported argument type {:?}",
            other
        ))),
    }
}
