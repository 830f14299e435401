use ethers::abi::{Abi, AbiParser, Token};
use ethers::prelude::abigen;
use ethers::types::{Address, Bytes, U256};

use crate::error::{AppError, Result};

// Read-only ERC-20 surface used by the token inspector.
abigen!(
    Erc20Token,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
    ]"#
);

const BATCH_ABI: &[&str] = &[
    "function batchSend(address[] recipients, uint256[] amounts) external payable",
    "function batchSendERC20(address token, address[] recipients, uint256[] amounts) external payable",
];

const APPROVE_ABI: &[&str] =
    &["function approve(address spender, uint256 amount) external returns (bool)"];

fn parse_abi(declarations: &[&str]) -> Result<Abi> {
    AbiParser::default()
        .parse(declarations)
        .map_err(|e| AppError::Internal(format!("ABI parse error: {e}")))
}

fn encode_call(abi: &Abi, name: &str, args: &[Token]) -> Result<Bytes> {
    let function = abi
        .function(name)
        .map_err(|e| AppError::Internal(format!("Unknown contract function {name}: {e}")))?;
    let data = function
        .encode_input(args)
        .map_err(|e| AppError::Internal(format!("Failed to encode {name} call: {e}")))?;
    Ok(Bytes::from(data))
}

fn address_array(addresses: &[Address]) -> Token {
    Token::Array(addresses.iter().map(|a| Token::Address(*a)).collect())
}

fn uint_array(amounts: &[U256]) -> Token {
    Token::Array(amounts.iter().map(|a| Token::Uint(*a)).collect())
}

/// Calldata for the native batch method: `batchSend(address[],uint256[])`.
pub fn encode_batch_send(recipients: &[Address], amounts: &[U256]) -> Result<Bytes> {
    let abi = parse_abi(BATCH_ABI)?;
    encode_call(
        &abi,
        "batchSend",
        &[address_array(recipients), uint_array(amounts)],
    )
}

/// Calldata for the token batch method:
/// `batchSendERC20(address,address[],uint256[])`.
pub fn encode_batch_send_erc20(
    token: Address,
    recipients: &[Address],
    amounts: &[U256],
) -> Result<Bytes> {
    let abi = parse_abi(BATCH_ABI)?;
    encode_call(
        &abi,
        "batchSendERC20",
        &[
            Token::Address(token),
            address_array(recipients),
            uint_array(amounts),
        ],
    )
}

/// Calldata for `approve(address,uint256)` on the token contract.
pub fn encode_approve(spender: Address, amount: U256) -> Result<Bytes> {
    let abi = parse_abi(APPROVE_ABI)?;
    encode_call(
        &abi,
        "approve",
        &[Token::Address(spender), Token::Uint(amount)],
    )
}
