// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the framing layer.

use proptest::prelude::*;

use super::*;

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic_the_decoder(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode::<Request>(&bytes);
    }

    #[test]
    fn framing_preserves_any_body(body in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_message(&mut buffer, &body).await.unwrap();
            prop_assert_eq!(buffer.len(), body.len() + 4);
            let mut cursor = std::io::Cursor::new(buffer);
            prop_assert_eq!(read_message(&mut cursor).await.unwrap(), body.clone());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
