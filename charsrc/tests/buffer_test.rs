mod chunk_reader;
mod one_byte_reader;

use charsrc::buffer::Buffer;
use chunk_reader::ChunkReader;
use one_byte_reader::OneByteReader;

#[test]
fn reads_until_exhausted_then_reports_eof() {
    let mut input: &[u8] = b"abcdef";
    let mut buf = Buffer::with_capacity(&mut input, 4);

    let mut collected = Vec::new();
    while let Some(b) = buf.next_byte().unwrap() {
        collected.push(b);
    }
    assert_eq!(collected, b"abcdef");
}

#[test]
fn tracks_line_and_column() {
    let mut input: &[u8] = b"ab\ncd";
    let mut buf = Buffer::new(&mut input);

    assert_eq!(buf.position.line, 1);
    assert_eq!(buf.position.column, 1);
    buf.next_byte().unwrap(); // 'a'
    assert_eq!(buf.position.column, 2);
    buf.next_byte().unwrap(); // 'b'
    buf.next_byte().unwrap(); // '\n'
    assert_eq!(buf.position.line, 2);
    assert_eq!(buf.position.column, 1);
}

#[test]
fn peek_does_not_consume() {
    let mut input: &[u8] = b"xy";
    let mut buf = Buffer::new(&mut input);

    assert_eq!(buf.peek_byte().unwrap(), Some(b'x'));
    assert_eq!(buf.peek_byte().unwrap(), Some(b'x'));
    assert_eq!(buf.next_byte().unwrap(), Some(b'x'));
    assert_eq!(buf.next_byte().unwrap(), Some(b'y'));
    assert_eq!(buf.next_byte().unwrap(), None);
}

#[test]
fn refills_across_small_chunks_from_interrupted_reader() {
    let data: Vec<u8> = b"1234560789".to_vec();
    let mut reader = ChunkReader::new(&data, b'6');
    let mut buf = Buffer::with_capacity(&mut reader, 3);

    let mut collected = Vec::new();
    while let Some(b) = buf.next_byte().unwrap() {
        collected.push(b);
    }
    // the interrupt byte ('6') is consumed by ChunkReader itself, not seen here
    assert_eq!(collected, b"123450789".to_vec());
}

#[test]
fn refills_one_byte_at_a_time() {
    let data = b"streaming".to_vec();
    let mut reader = OneByteReader::new(data.clone().into_iter());
    let mut buf = Buffer::with_capacity(&mut reader, 2);

    let mut collected = Vec::new();
    while let Some(b) = buf.next_byte().unwrap() {
        collected.push(b);
    }
    assert_eq!(collected, data);
}
