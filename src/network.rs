//! WAX network descriptors.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Static details for one [`Network`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: &'static str,
    pub chain_id: &'static str,
    pub rpc_endpoint: &'static str,
    /// Account subscription payments are sent to.
    pub payment_wallet: &'static str,
    pub explorer_url: &'static str,
}

static MAINNET: NetworkInfo = NetworkInfo {
    name: "WAX Mainnet",
    chain_id: "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4",
    rpc_endpoint: "https://wax.greymass.com",
    payment_wallet: "payment.gm",
    explorer_url: "https://waxblock.io",
};

static TESTNET: NetworkInfo = NetworkInfo {
    name: "WAX Testnet",
    chain_id: "f16b1833c747c43682f4386fca9cbb327929334a762755ebec17f6f23c9b8a12",
    rpc_endpoint: "https://testnet.waxsweden.org",
    payment_wallet: "testpay.gm",
    explorer_url: "https://wax-testnet.bloks.io",
};

impl Network {
    pub fn info(self) -> &'static NetworkInfo {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Testnet => &TESTNET,
        }
    }

    pub fn explorer_tx_url(self, transaction_id: &str) -> String {
        format!("{}/transaction/{transaction_id}", self.info().explorer_url)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(AppError::Config(format!("unknown network '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_wallet_per_network() {
        assert_eq!(Network::Mainnet.info().payment_wallet, "payment.gm");
        assert_eq!(Network::Testnet.info().payment_wallet, "testpay.gm");
    }

    #[test]
    fn explorer_links() {
        assert_eq!(
            Network::Mainnet.explorer_tx_url("abc"),
            "https://waxblock.io/transaction/abc"
        );
        assert_eq!(
            Network::Testnet.explorer_tx_url("abc"),
            "https://wax-testnet.bloks.io/transaction/abc"
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("TestNet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("devnet".parse::<Network>().is_err());
    }
}
