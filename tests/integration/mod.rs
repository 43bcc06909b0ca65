mod basic_integration;
mod mcp_flow;
