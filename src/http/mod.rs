//! HTTP plumbing: request encoding and the transport to the endpoint

pub mod codec;
pub mod transport;

use std::collections::BTreeMap;

pub use codec::{decode_response, encode_request, Variables, MEDIATYPE_JSON};
pub use transport::{HttpTransport, Transport};

/// Header name to value, applied to every call of a test case
pub type Headers = BTreeMap<String, String>;
