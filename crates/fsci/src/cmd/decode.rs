use bytes::BytesMut;
use fsci_frame::{decode_packet, DEFAULT_MAX_PAYLOAD};

use crate::cmd::{decode_record, parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut buf = BytesMut::from(parse_hex(&args.hex)?.as_slice());
    let packet = decode_packet(&mut buf, DEFAULT_MAX_PAYLOAD)
        .map_err(|err| frame_error("framing failed", err))?
        .ok_or_else(|| CliError::new(DATA_INVALID, "input does not hold a whole packet"))?;
    if !buf.is_empty() {
        tracing::warn!(trailing = buf.len(), "bytes after the first packet ignored");
    }

    let decoded = decode_record(&packet, args.direction.into(), args.features.features())?;
    print_packet(&decoded, format);
    Ok(SUCCESS)
}
