pub mod request;
pub mod response;

pub use request::{
    BollingerArgs, ClientInfo, InitializeParams, JsonRpcMessage, KeywordMentionsArgs, Keywords,
    QueryArgs, QueryScalar, RpcId, RsiArgs, SetAuthArgs, SetBaseArgs, SummaryArgs, TokenNewsArgs,
    ToolCallParams, TrendingArgs,
};
pub use response::{
    JsonRpcError, JsonRpcNotification, JsonRpcResponse, ToolError, ToolResult, ToolResultContent,
    JSONRPC_VERSION,
};
