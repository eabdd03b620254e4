//! Turns raw `getTransaction` bodies into [`TransactionRecord`]s from the point of
//! view of one wallet.
//!
//! A body is classified by the first System Program `transfer` instruction it
//! carries. Without one, the wallet's native balance delta decides the amount and
//! direction, and the program of the first instruction refines the type.

use crate::domain::models::{Direction, TransactionRecord, TransactionType};
use solana_sdk::{native_token::lamports_to_sol, system_program};
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInstruction, UiMessage,
    UiParsedInstruction, UiTransactionStatusMeta,
};

/// Number of signatures requested per wallet.
pub const SIGNATURE_WINDOW: usize = 200;

/// Number of records kept after merging all wallets.
pub const RECENT_TRANSACTIONS: usize = 50;

struct NativeTransfer<'a> {
    source: &'a str,
    destination: &'a str,
    lamports: u64,
}

/// The parts of a message the classifier looks at, independent of its encoding.
#[derive(Default)]
struct MessageView<'a> {
    account_keys: Vec<&'a str>,
    first_program_id: Option<&'a str>,
    transfer: Option<NativeTransfer<'a>>,
}

impl<'a> MessageView<'a> {
    fn from_transaction(transaction: &'a EncodedTransaction) -> Self {
        let EncodedTransaction::Json(ui_transaction) = transaction else {
            return Self::default();
        };

        match &ui_transaction.message {
            UiMessage::Parsed(message) => {
                let account_keys: Vec<&str> = message
                    .account_keys
                    .iter()
                    .map(|key| key.pubkey.as_str())
                    .collect();
                let first_program_id = message
                    .instructions
                    .first()
                    .and_then(|ix| program_id(ix, &account_keys));
                let transfer = message.instructions.iter().find_map(native_transfer);
                Self {
                    account_keys,
                    first_program_id,
                    transfer,
                }
            }
            UiMessage::Raw(message) => {
                let account_keys: Vec<&str> =
                    message.account_keys.iter().map(String::as_str).collect();
                let first_program_id = message
                    .instructions
                    .first()
                    .and_then(|ix| account_keys.get(ix.program_id_index as usize).copied());
                Self {
                    account_keys,
                    first_program_id,
                    transfer: None,
                }
            }
        }
    }
}

fn program_id<'a>(instruction: &'a UiInstruction, account_keys: &[&'a str]) -> Option<&'a str> {
    match instruction {
        UiInstruction::Compiled(ix) => account_keys.get(ix.program_id_index as usize).copied(),
        UiInstruction::Parsed(UiParsedInstruction::Parsed(ix)) => Some(ix.program_id.as_str()),
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(ix)) => {
            Some(ix.program_id.as_str())
        }
    }
}

fn native_transfer(instruction: &UiInstruction) -> Option<NativeTransfer<'_>> {
    let UiInstruction::Parsed(UiParsedInstruction::Parsed(ix)) = instruction else {
        return None;
    };
    if ix.program_id != system_program::id().to_string() {
        return None;
    }
    if ix.parsed.get("type").and_then(|t| t.as_str()) != Some("transfer") {
        return None;
    }
    let info = ix.parsed.get("info")?;
    Some(NativeTransfer {
        source: info.get("source")?.as_str()?,
        destination: info.get("destination")?.as_str()?,
        lamports: info.get("lamports")?.as_u64()?,
    })
}

/// Signed lamport change of the account at `index`, if the meta lists it.
fn balance_delta(meta: &UiTransactionStatusMeta, index: usize) -> Option<i128> {
    let pre = *meta.pre_balances.get(index)?;
    let post = *meta.post_balances.get(index)?;
    Some(post as i128 - pre as i128)
}

/// Classifies one transaction body for `wallet`.
///
/// A missing body or a body without metadata is a data gap.
pub fn classify_transaction(
    wallet: &str,
    signature: &str,
    transaction: Option<&EncodedConfirmedTransactionWithStatusMeta>,
) -> TransactionRecord {
    let Some(transaction) = transaction else {
        return TransactionRecord::data_gap(signature, wallet);
    };
    let Some(meta) = transaction.transaction.meta.as_ref() else {
        return TransactionRecord::data_gap(signature, wallet);
    };

    let mut record = TransactionRecord {
        signature: signature.to_string(),
        slot: Some(transaction.slot),
        block_time: transaction.block_time,
        amount: 0.0,
        direction: Direction::Unknown,
        success: meta.err.is_none(),
        kind: TransactionType::ProgramCall,
        wallet_address: wallet.to_string(),
    };

    let message = MessageView::from_transaction(&transaction.transaction.transaction);

    if let Some(transfer) = message.transfer {
        record.amount = lamports_to_sol(transfer.lamports);
        record.kind = TransactionType::NativeTransfer;
        // Source is checked first, so a self transfer reads as sent.
        if transfer.source == wallet {
            record.direction = Direction::Sent;
        } else if transfer.destination == wallet {
            record.direction = Direction::Received;
        }
        return record;
    }

    let delta = message
        .account_keys
        .iter()
        .position(|key| *key == wallet)
        .and_then(|index| balance_delta(meta, index));

    if let Some(delta) = delta.filter(|delta| *delta != 0) {
        record.amount = lamports_to_sol(delta.unsigned_abs() as u64);
        record.direction = if delta > 0 {
            Direction::Received
        } else {
            Direction::Sent
        };

        let token_program = spl_token::id().to_string();
        let system = system_program::id().to_string();
        match message.first_program_id {
            Some(program) if program == token_program => {
                record.kind = TransactionType::TokenOperation;
            }
            Some(program) if program != system => {
                record.kind = TransactionType::ProgramInteraction;
            }
            _ => {}
        }
    }

    record
}

/// Classifies a batch fetched for `signatures`, pairing bodies by position.
pub fn classify_batch(
    wallet: &str,
    signatures: &[String],
    bodies: &[Option<EncodedConfirmedTransactionWithStatusMeta>],
) -> Vec<TransactionRecord> {
    signatures
        .iter()
        .enumerate()
        .map(|(index, signature)| {
            let body = bodies.get(index).and_then(Option::as_ref);
            classify_transaction(wallet, signature, body)
        })
        .collect()
}

/// Newest first, undated records last, capped at [`RECENT_TRANSACTIONS`].
pub fn assemble_recent(mut records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    records.sort_by(|a, b| b.block_time.unwrap_or(0).cmp(&a.block_time.unwrap_or(0)));
    records.truncate(RECENT_TRANSACTIONS);
    records
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};
    use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;

    pub const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
    pub const OTHER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";
    pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
    pub const MEMO_PROGRAM: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

    pub fn system_transfer(source: &str, destination: &str, lamports: u64) -> Value {
        json!({
            "program": "system",
            "programId": SYSTEM_PROGRAM,
            "parsed": {
                "type": "transfer",
                "info": { "source": source, "destination": destination, "lamports": lamports }
            },
            "stackHeight": null
        })
    }

    pub fn token_transfer(authority: &str) -> Value {
        json!({
            "program": "spl-token",
            "programId": TOKEN_PROGRAM,
            "parsed": {
                "type": "transfer",
                "info": {
                    "source": "3Lxm5pXhD2UvGQ7ifhnGLDDeFq6gx8sT8p2bbD5VyRzj",
                    "destination": "5ZWj7a1f8tWkjBESHKgrLmXshuXxqeY9SYcfbshpAqPG",
                    "authority": authority,
                    "amount": "1000"
                }
            },
            "stackHeight": null
        })
    }

    pub fn opaque_instruction(program_id: &str) -> Value {
        json!({
            "programId": program_id,
            "accounts": [WALLET],
            "data": "3Bxs4h24hBtQy9rw",
            "stackHeight": null
        })
    }

    pub fn transaction(
        block_time: Option<i64>,
        keys: &[&str],
        instructions: Vec<Value>,
        pre_balances: &[u64],
        post_balances: &[u64],
        failed: bool,
    ) -> EncodedConfirmedTransactionWithStatusMeta {
        let account_keys: Vec<Value> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| json!({ "pubkey": key, "signer": i == 0, "writable": true }))
            .collect();
        let (err, status) = if failed {
            let err = json!({ "InstructionError": [0, { "Custom": 1 }] });
            (err.clone(), json!({ "Err": err }))
        } else {
            (Value::Null, json!({ "Ok": null }))
        };
        serde_json::from_value(json!({
            "slot": 250_000_000u64,
            "blockTime": block_time,
            "transaction": {
                "signatures": ["5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"],
                "message": {
                    "accountKeys": account_keys,
                    "instructions": instructions,
                    "recentBlockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N"
                }
            },
            "meta": {
                "err": err,
                "status": status,
                "fee": 5000,
                "preBalances": pre_balances,
                "postBalances": post_balances,
                "innerInstructions": [],
                "logMessages": [],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "rewards": []
            }
        }))
        .expect("fixture matches the RPC transaction shape")
    }

    pub fn without_meta(
        mut tx: EncodedConfirmedTransactionWithStatusMeta,
    ) -> EncodedConfirmedTransactionWithStatusMeta {
        tx.transaction.meta = None;
        tx
    }
}
