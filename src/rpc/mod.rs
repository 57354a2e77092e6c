/// JSON-RPC client and passthrough helpers
pub mod client;

pub use client::{JsonRpcClient, RpcError, call_json_rpc, format_result, parse_args};
