//! Serialization Module Tests
//!
//! Checks the byte layout of the primitives every operation frame is built from and
//! the reader's behavior on malformed input.

#[cfg(test)]
mod tests {
    use crate::error::ClusterError;
    use crate::serialization::{Data, ObjectDataInput, ObjectDataOutput};

    // ============================================================
    // BYTE LAYOUT
    // ============================================================

    #[test]
    fn test_int32_is_big_endian() {
        let mut out = ObjectDataOutput::new();
        out.write_i32(0x0102_0304);
        out.write_i32(-1);

        assert_eq!(
            out.into_bytes().as_ref(),
            &[0x01, 0x02, 0x03, 0x04, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_utf_is_length_prefixed() {
        let mut out = ObjectDataOutput::new();
        out.write_utf("héllo");

        let bytes = out.into_bytes();
        // "é" is two bytes in UTF-8
        assert_eq!(&bytes[..4], &[0, 0, 0, 6]);
        assert_eq!(&bytes[4..], "héllo".as_bytes());
    }

    #[test]
    fn test_nullable_data_layout() {
        let mut out = ObjectDataOutput::new();
        out.write_nullable_data(Some(&Data::from("ab")));
        out.write_nullable_data(None);

        assert_eq!(out.into_bytes().as_ref(), &[1, 0, 0, 0, 2, b'a', b'b', 0]);
    }

    // ============================================================
    // READING
    // ============================================================

    #[test]
    fn test_reader_mirrors_writer() {
        let mut out = ObjectDataOutput::new();
        out.write_utf("orders");
        out.write_i32(42);
        out.write_nullable_data(Some(&Data::from(vec![0u8, 1, 2])));
        out.write_nullable_data(None);
        out.write_data(&Data::default());

        let mut input = ObjectDataInput::new(out.into_bytes());
        assert_eq!(input.read_utf().unwrap(), "orders");
        assert_eq!(input.read_i32().unwrap(), 42);
        assert_eq!(
            input.read_nullable_data().unwrap(),
            Some(Data::from(vec![0u8, 1, 2]))
        );
        assert_eq!(input.read_nullable_data().unwrap(), None);
        assert!(input.read_data().unwrap().is_empty());
        assert!(input.ensure_consumed().is_ok());
    }

    #[test]
    fn test_truncated_int_is_decode_error() {
        let mut input = ObjectDataInput::new(vec![0u8, 0, 1]);

        let err = input.read_i32().unwrap_err();
        assert!(matches!(err, ClusterError::Decode(_)));
    }

    #[test]
    fn test_truncated_payload_is_decode_error() {
        // Claims 10 bytes, carries 3
        let mut input = ObjectDataInput::new(vec![0u8, 0, 0, 10, 1, 2, 3]);

        assert!(matches!(input.read_data(), Err(ClusterError::Decode(_))));
    }

    #[test]
    fn test_negative_length_is_decode_error() {
        let mut out = ObjectDataOutput::new();
        out.write_i32(-5);

        let mut input = ObjectDataInput::new(out.into_bytes());
        let err = input.read_utf().unwrap_err();
        assert!(err.to_string().contains("negative length"));
    }

    #[test]
    fn test_invalid_presence_flag_is_decode_error() {
        let mut input = ObjectDataInput::new(vec![7u8]);

        assert!(matches!(
            input.read_nullable_data(),
            Err(ClusterError::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let mut input = ObjectDataInput::new(vec![0u8, 0, 0, 2, 0xc3, 0x28]);

        assert!(matches!(input.read_utf(), Err(ClusterError::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes_detected() {
        let mut input = ObjectDataInput::new(vec![0u8, 0, 0, 1, 9]);
        input.read_i32().unwrap();

        assert_eq!(input.remaining(), 1);
        assert!(input.ensure_consumed().is_err());
    }

    #[test]
    fn test_data_debug_shows_short_text() {
        assert_eq!(format!("{:?}", Data::from("a")), "Data(\"a\")");
        assert_eq!(
            format!("{:?}", Data::from(vec![0xffu8; 3])),
            "Data(3 bytes)"
        );
    }
}
