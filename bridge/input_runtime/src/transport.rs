use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;

use crate::error::{BridgeError, Result};

/// Largest command payload written to the native peer.
pub const OUTBOUND_FRAME_CAP: usize = 65_536;
/// Largest envelope accepted from the native peer.
pub const INBOUND_FRAME_CAP: usize = 1_048_576;

/// Drains encoded commands onto `writer` until every sender is dropped.
pub fn writer_loop<W: Write>(rx: Receiver<Vec<u8>>, mut writer: W) -> Result<()> {
    for payload in rx {
        write_frame(&mut writer, &payload, OUTBOUND_FRAME_CAP)?;
        writer.flush()?;
    }

    Ok(())
}

/// Reads envelopes off `reader` until EOF. A clean EOF between frames ends
/// the loop without error.
pub fn reader_loop<R, F>(mut reader: R, mut on_envelope: F) -> Result<()>
where
    R: Read,
    F: FnMut(String),
{
    loop {
        match read_frame(&mut reader, INBOUND_FRAME_CAP) {
            Ok(payload) => {
                let raw = String::from_utf8(payload).map_err(|err| {
                    io::Error::new(io::ErrorKind::InvalidData, err.utf8_error())
                })?;
                on_envelope(raw);
            }
            Err(BridgeError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(());
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn read_frame(reader: &mut impl Read, max_payload: usize) -> Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(BridgeError::FrameTooLarge {
            len,
            max: max_payload,
        });
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> Result<()> {
    if payload.len() > max_payload {
        return Err(BridgeError::FrameTooLarge {
            len: payload.len(),
            max: max_payload,
        });
    }

    let len = u32::try_from(payload.len()).map_err(|_| BridgeError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn write_then_read_round_trip() {
        let payload = br#"{"name":"mobileinput","data":"{}"}"#;
        let mut out = Vec::new();

        write_frame(&mut out, payload, OUTBOUND_FRAME_CAP).expect("frame write");

        let mut cursor = Cursor::new(out);
        let decoded = read_frame(&mut cursor, OUTBOUND_FRAME_CAP).expect("frame read");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 5, b'a', b'b']);
        let err = read_frame(&mut cursor, INBOUND_FRAME_CAP).expect_err("expected eof");

        match err {
            BridgeError::Io(err) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let len = (OUTBOUND_FRAME_CAP as u32) + 1;
        let mut cursor = Cursor::new(len.to_be_bytes().to_vec());
        let err = read_frame(&mut cursor, OUTBOUND_FRAME_CAP).expect_err("expected too large");

        assert!(matches!(
            err,
            BridgeError::FrameTooLarge { len: 65_537, max: OUTBOUND_FRAME_CAP }
        ));
    }

    #[test]
    fn endian_is_big_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc", OUTBOUND_FRAME_CAP).expect("frame write");
        assert_eq!(&out[0..4], &[0, 0, 0, 3]);
    }

    #[test]
    fn reader_loop_stops_cleanly_at_eof() {
        let mut input = Vec::new();
        write_frame(&mut input, b"first", INBOUND_FRAME_CAP).expect("frame write");
        write_frame(&mut input, b"second", INBOUND_FRAME_CAP).expect("frame write");

        let mut seen = Vec::new();
        reader_loop(Cursor::new(input), |raw| seen.push(raw)).expect("reader loop");

        assert_eq!(seen, ["first", "second"]);
    }

    #[test]
    fn reader_loop_rejects_invalid_utf8() {
        let mut input = Vec::new();
        write_frame(&mut input, &[0xff, 0xfe], INBOUND_FRAME_CAP).expect("frame write");

        let err = reader_loop(Cursor::new(input), |_| {}).expect_err("invalid utf8");
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn writer_loop_frames_each_payload() {
        let (tx, rx) = mpsc::sync_channel(4);
        tx.send(b"one".to_vec()).expect("queue payload");
        tx.send(b"two".to_vec()).expect("queue payload");
        drop(tx);

        let mut out = Vec::new();
        writer_loop(rx, &mut out).expect("writer loop");

        let mut cursor = Cursor::new(out);
        assert_eq!(read_frame(&mut cursor, OUTBOUND_FRAME_CAP).expect("first"), b"one");
        assert_eq!(read_frame(&mut cursor, OUTBOUND_FRAME_CAP).expect("second"), b"two");
    }
}
