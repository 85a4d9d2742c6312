// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! The frame encoding. Every value crossing a channel is serialized with
//! bincode using fixed width little endian integers: enum variants are
//! prefixed by their index (u32), sequences and byte strings by their length
//! (u64). Frames larger than `MAX_FRAME_LEN` are refused both ways, and a
//! frame must be consumed entirely to be valid.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::{BcpError, BcpResult};

/// The largest frame (in bytes) that is ever encoded or decoded
pub const MAX_FRAME_LEN: u64 = 1 << 30;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_FRAME_LEN)
        .reject_trailing_bytes()
}

/// Encodes a value into a fresh frame
pub fn to_bytes<T: Serialize>(value: &T) -> BcpResult<Vec<u8>> {
    options().serialize(value).map_err(|e| BcpError::Encoding {
        message: std::any::type_name::<T>(),
        reason : e.to_string(),
    })
}

/// Decodes a value from a frame. The whole frame must be consumed.
///
/// # Example
/// ```
/// # use bcp::*;
/// let bytes = to_bytes(&Message::RequestBranchingIds(3)).unwrap();
/// assert_eq!(Message::RequestBranchingIds(3), from_bytes::<Message>(&bytes).unwrap());
///
/// let mut longer = bytes.clone();
/// longer.push(0);
/// assert!(matches!(from_bytes::<Message>(&longer), Err(BcpError::Malformed { .. })));
/// assert!(matches!(from_bytes::<Message>(&bytes[..2]), Err(BcpError::Malformed { .. })));
/// ```
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> BcpResult<T> {
    options().deserialize(bytes).map_err(|e| BcpError::Malformed {
        len   : bytes.len(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod test_codec {
    use std::sync::Arc;

    use crate::*;

    fn variable(data: Vec<u8>) -> Variable {
        Variable { tag: 5, id: 0x0102, lb: -1.5, ub: 2.0, obj: -4.25, data }
    }

    #[test]
    fn integers_are_fixed_width_little_endian() {
        assert_eq!(vec![2, 1, 0, 0, 0, 0, 0, 0], to_bytes(&NodeId(0x0102)).unwrap());
        assert_eq!(vec![7, 0, 0, 0, 0, 0, 0, 0], to_bytes(&WorkerId(7)).unwrap());
    }
    #[test]
    fn a_payload_starts_with_its_kind_then_the_application_tag() {
        let bytes = to_bytes(&Payload::from(variable(vec![]))).unwrap();
        // kind (variable), tag, id
        assert_eq!(&[0, 0, 0, 0, 5, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 0], &bytes[..16]);
        let cut = to_bytes(&Payload::from(Cut { tag: 2, id: 1, lb: 0.0, ub: 1.0, data: vec![] })).unwrap();
        assert_eq!(&[1, 0, 0, 0, 2, 0, 0, 0], &cut[..8]);
    }
    #[test]
    fn application_data_is_length_prefixed() {
        let bytes = to_bytes(&variable(b"ab".to_vec())).unwrap();
        // tag + id + lb + ub + obj, then the length and the bytes
        let data = 4 + 8 + 3 * 8;
        assert_eq!(&[2, 0, 0, 0, 0, 0, 0, 0, b'a', b'b'], &bytes[data..]);
    }
    #[test]
    fn variables_keep_their_identity_bounds_and_objective() {
        let v = variable(vec![9, 8, 7]);
        let back: Payload = from_bytes(&to_bytes(&Payload::from(v.clone())).unwrap()).unwrap();
        assert_eq!(Payload::Variable(Arc::new(v)), back);
    }
    #[test]
    fn an_unknown_payload_kind_is_malformed() {
        let mut bytes = to_bytes(&Payload::from(Cut { tag: 2, id: 1, lb: 0.0, ub: 1.0, data: vec![] })).unwrap();
        bytes[0] = 9;
        assert!(matches!(from_bytes::<Payload>(&bytes), Err(BcpError::Malformed { .. })));
    }
    #[test]
    fn truncated_application_data_is_malformed() {
        let bytes = to_bytes(&Payload::from(variable(vec![1, 2, 3]))).unwrap();
        assert!(matches!(from_bytes::<Payload>(&bytes[..bytes.len() - 1]), Err(BcpError::Malformed { .. })));
    }
    #[test]
    fn a_lying_length_fails_without_allocating() {
        let mut bytes = to_bytes(&variable(vec![1])).unwrap();
        let len = bytes.len() - 9;
        bytes[len..len + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(from_bytes::<Variable>(&bytes), Err(BcpError::Malformed { .. })));

        let mut seq = to_bytes(&Solution { objective: 0.0, values: vec![] }).unwrap();
        seq[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(from_bytes::<Solution>(&seq), Err(BcpError::Malformed { .. })));
    }
    #[test]
    fn a_formulation_survives_the_wire() {
        let lp = Formulation {
            variables: vec![Arc::new(Variable { tag: 0, id: 1, lb: 0.0, ub: 1.0, obj: -3.0, data: vec![1] })],
            cuts: vec![Arc::new(Cut { tag: 1, id: 2, lb: f64::NEG_INFINITY, ub: 4.0, data: vec![2, 2] })],
            bound_changes: vec![BoundChange { var: 1, lb: 1.0, ub: 1.0 }],
        };
        assert_eq!(lp, from_bytes::<Formulation>(&to_bytes(&lp).unwrap()).unwrap());
    }
    #[test]
    fn floats_survive_exactly() {
        let values = vec![-0.1, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE];
        assert_eq!(values, from_bytes::<Vec<f64>>(&to_bytes(&values).unwrap()).unwrap());
    }
}
