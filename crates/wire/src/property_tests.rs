// SPDX-License-Identifier: MIT

//! Property: the frame reader reconstructs a message regardless of how
//! the underlying stream happens to chunk it, per 's framing
//! contract (a message may legitimately arrive split across reads).

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::io::{duplex, AsyncWriteExt};

use crate::codec::FrameReader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    n: u32,
    s: String,
}

proptest! {
    #[test]
    fn frame_reader_survives_arbitrary_chunk_boundaries(
        n in any::<u32>(),
        s in ".{0,64}",
        chunk_sizes in prop::collection::vec(1usize..7, 1..20),
    ) {
        let msg = Sample { n, s };
        let bytes = serde_json::to_vec(&msg).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let (mut client, server) = duplex(bytes.len().max(16) + 64);
            let writer = tokio::spawn(async move {
                let mut offset = 0;
                let mut sizes = chunk_sizes.into_iter().cycle();
                while offset < bytes.len() {
                    let step = sizes.next().unwrap_or(1).min(bytes.len() - offset);
                    client.write_all(&bytes[offset..offset + step]).await.unwrap();
                    offset += step;
                }
                drop(client);
            });

            let mut reader = FrameReader::new(server);
            let got: Sample = reader.read_message().await.unwrap().unwrap();
            prop_assert_eq!(got, msg);
            writer.await.unwrap();
            Ok(())
        })?;
    }
}
