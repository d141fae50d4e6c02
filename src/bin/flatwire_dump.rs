//! Dump a packed payload as flat leaves.
//!
//! Usage:
//!   flatwire_dump [OPTIONS] FORMAT [HEX]
//!   flatwire_dump --frame [HEX]
//!
//! FORMAT is a format string such as `!2shf`. HEX is the packed payload; if it is
//! omitted, it is read from stdin. Whitespace in HEX is ignored.
//!
//! Options:
//!   --frame, -F   HEX is a whole frame (length-prefixed format text + payload)
//!   --info, -i    Only describe FORMAT (slots, packed length, stripped form)
//!
//! Set RUST_LOG=debug for codec logging.

use flatwire::dump::{format_scalar, parse_hex};
use flatwire::{unpack, FormatString, Frame};
use std::io::{self, Read};

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == long || a == short) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn read_hex(arg: Option<&String>) -> anyhow::Result<Vec<u8>> {
    let text = match arg {
        Some(s) => s.clone(),
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            s
        }
    };
    parse_hex(&text).map_err(|e| anyhow::anyhow!(e))
}

fn describe(format: &FormatString) {
    println!("format:  {}", format.packer_format());
    println!("slots:   {}", format.leaf_count());
    println!("bytes:   {}", format.byte_len());
    println!("shape:   {}", format.stripped());
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let framed = take_flag(&mut args, "--frame", "-F");
    let info = take_flag(&mut args, "--info", "-i");

    let (format, payload) = if framed {
        let frame = Frame::decode(&read_hex(args.first())?)?;
        (frame.format, frame.payload)
    } else {
        let text = args
            .first()
            .ok_or_else(|| anyhow::anyhow!("usage: flatwire_dump [--frame] [--info] FORMAT [HEX]"))?;
        let format = FormatString::parse(text)?;
        if info {
            describe(&format);
            return Ok(());
        }
        let payload = read_hex(args.get(1))?;
        (format, payload)
    };

    if info {
        describe(&format);
        return Ok(());
    }
    let leaves = unpack(&payload, &format)?;
    for (i, (code, leaf)) in format.codes().iter().zip(&leaves).enumerate() {
        println!("{:>4}  {:<5} {}", i, code.to_string(), format_scalar(leaf));
    }
    eprintln!("{} leaves, {} bytes", leaves.len(), payload.len());
    Ok(())
}
