/// One entry of a `getSignaturesForAddress` result.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRef {
    /// Transaction signature (base58).
    pub signature: String,
    /// Slot the transaction was confirmed in.
    #[serde(default)]
    pub slot: Option<u64>,
    /// On-chain error, `None` when the transaction succeeded.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    /// Optional memo attached to the transaction.
    #[serde(default)]
    pub memo: Option<String>,
    /// Block time as a unix timestamp in seconds.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// `processed`, `confirmed` or `finalized`.
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureRef {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            slot: None,
            err: None,
            memo: None,
            block_time: None,
            confirmation_status: None,
        }
    }

    /// Abbreviated signature for log fields.
    pub fn short(&self) -> &str {
        self.signature.get(..16).unwrap_or(&self.signature)
    }
}

/// A `getTransaction` result in `jsonParsed` encoding.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRecord {
    /// Block time in seconds since epoch; absent for very old or unconfirmed slots.
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionEnvelope,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TransactionEnvelope {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: Message,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// An account referenced by the transaction message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "AccountKeyRepr")]
pub struct AccountKey {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

/// `jsonParsed` sends objects, `json`/`base64` encodings send bare strings.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum AccountKeyRepr {
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
    },
    Plain(String),
}

impl From<AccountKeyRepr> for AccountKey {
    fn from(repr: AccountKeyRepr) -> Self {
        match repr {
            AccountKeyRepr::Parsed {
                pubkey,
                signer,
                writable,
            } => Self {
                pubkey,
                signer,
                writable,
            },
            AccountKeyRepr::Plain(pubkey) => Self {
                pubkey,
                signer: false,
                writable: false,
            },
        }
    }
}

/// A program invocation. `parsed` is an object for programs the node knows how
/// to decode (`{"type": .., "info": {..}}`) and a bare string for memo-like
/// programs, so it stays untyped here.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub parsed: Option<serde_json::Value>,
}

impl Instruction {
    /// `parsed.type`, when the instruction was decoded into an object.
    pub fn parsed_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }

    /// A string field of `parsed.info`.
    pub fn info_field(&self, field: &str) -> Option<&str> {
        self.parsed.as_ref()?.get("info")?.get(field)?.as_str()
    }
}

/// Per-account token balance from `meta.preTokenBalances` / `meta.postTokenBalances`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Index into `message.accountKeys`.
    pub account_index: usize,
    pub mint: String,
    /// Wallet owning the token account; older slots omit it.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    /// Raw integer amount in the token's smallest unit.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl UiTokenAmount {
    /// Raw amount as an integer; a missing amount counts as zero.
    pub fn raw(&self) -> Option<i128> {
        let trimmed = self.amount.trim();
        if trimmed.is_empty() {
            return Some(0);
        }
        trimmed.parse().ok()
    }
}

impl RawTransactionRecord {
    pub fn account_keys(&self) -> &[AccountKey] {
        &self.transaction.message.account_keys
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.transaction.message.instructions
    }

    pub fn pre_token_balances(&self) -> Option<&[TokenBalance]> {
        self.meta.as_ref()?.pre_token_balances.as_deref()
    }

    pub fn post_token_balances(&self) -> Option<&[TokenBalance]> {
        self.meta.as_ref()?.post_token_balances.as_deref()
    }

    /// `meta.err`, when the transaction was included but failed.
    pub fn chain_error(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()?.err.as_ref().filter(|e| !e.is_null())
    }
}
