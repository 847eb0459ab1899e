use agentic_core::Frame;

/// Incremental server-sent-events parser.
///
/// Bytes may arrive split anywhere; a frame is emitted once its blank-line
/// delimiter (`\n\n` or `\r\n\r\n`) has been seen.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame_bytes: Vec<u8> = self.buf.drain(..idx + delim_len).take(idx).collect();
            if let Some(frame) = parse_sse_frame(&frame_bytes) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame left without its delimiter at end of stream.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buf);
        parse_sse_frame(&rest)
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len() && &buf[i..i + 4] == b"\r\n\r\n" {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

fn field_value(rest: &[u8]) -> &[u8] {
    rest.strip_prefix(b" ").unwrap_or(rest)
}

/// Parses one frame. Field names are ASCII; `data:` bytes are passed through
/// untouched so that payload validation stays with the codec.
fn parse_sse_frame(bytes: &[u8]) -> Option<Frame> {
    if bytes.is_empty() {
        return None;
    }
    let mut event: Option<String> = None;
    let mut data_lines: Vec<&[u8]> = Vec::new();
    for raw_line in bytes.split(|b| *b == b'\n') {
        let line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if line.is_empty() || line.starts_with(b":") {
            continue;
        }
        if let Some(rest) = line.strip_prefix(b"event:") {
            let name = String::from_utf8_lossy(field_value(rest));
            event = (!name.is_empty()).then(|| name.into_owned());
            continue;
        }
        if let Some(rest) = line.strip_prefix(b"data:") {
            data_lines.push(field_value(rest));
        } else if line == b"data" {
            data_lines.push(b"");
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(Frame::new(event, data_lines.join(&b'\n')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::{DecodeError, decode_frame};

    #[test]
    fn handles_partial_chunk_boundaries() {
        let mut decoder = SseDecoder::default();
        let part1 = b"event: RUN_STARTED\ndata: {\"type\":\"RUN_STARTED\",\"threadId\":\"t";
        let part2 = b"\",\"runId\":\"r\"}\n";
        let part3 = b"\n";
        assert!(decoder.push_chunk(part1).is_empty());
        assert!(decoder.push_chunk(part2).is_empty());
        let frames = decoder.push_chunk(part3);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("RUN_STARTED"));
        assert_eq!(
            frames[0].text(),
            Some(r#"{"type":"RUN_STARTED","threadId":"t","runId":"r"}"#)
        );
    }

    #[test]
    fn handles_crlf_comments_and_multi_line_data() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(
            b": keep-alive\r\n\r\ndata: {\"a\":\r\ndata: 1}\r\n\r\nevent: CUSTOM\ndata:x\n\n",
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame::new(None, "{\"a\":\n1}"));
        assert_eq!(frames[1], Frame::new(Some("CUSTOM".into()), "x"));
    }

    #[test]
    fn frames_without_data_are_dropped() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"event: ping\n\n").is_empty());
    }

    #[test]
    fn finish_flushes_undelimited_tail() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some(Frame::new(None, "tail")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn invalid_utf8_data_reaches_the_codec_unrepaired() {
        let mut decoder = SseDecoder::default();
        let mut chunk = b"event: TEXT_MESSAGE_CONTENT\ndata: ".to_vec();
        chunk.extend_from_slice(br#"{"type":"TEXT_MESSAGE_CONTENT","messageId":"m","delta":"a"#);
        chunk.push(0xFF);
        chunk.extend_from_slice(b"b\"}\n\n");
        let frames = decoder.push_chunk(&chunk);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].data.contains(&0xFF));
        assert!(matches!(
            decode_frame(&frames[0]),
            Err(DecodeError::MalformedPayload(_))
        ));
    }
}
