//! Memo grammar table and field scanner.
//!
//! Every memo is `TAG-{duration}-{code}` followed by an optional wallet
//! section. Shapes are tried in table order; the first one whose tag and
//! delimiter match owns the memo and either decodes it or rejects it.
//!
//! ```text
//! N-{d}-{tier}:{wallets}     new subscription
//! A-{d}-X:{wallets}          add wallet
//! W-{d}-X:{wallets}          wallet renewal
//! FS-{d}-{addon}:            subscription addon
//! FW-{d}-{addon}:{wallets}   wallet addon
//! R-{d}-{tier}[…]            subscription renewal
//! U-{d}-{tier}[…]            upgrade (d = 0 → immediate)
//! ```
//!
//! Renewal and upgrade memos may carry free text after the tier letter, with
//! or without a `:`; it is ignored.

use crate::error::AppError;

use super::IntentKind;

/// What the code field after the duration holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CodeField {
    /// One uppercase tier letter.
    Tier,
    /// The literal `X`.
    Placeholder,
    /// One or more uppercase letters naming an addon.
    Addon,
}

/// What follows the code field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WalletField {
    /// `:` then a non-empty comma-separated list.
    Required,
    /// Optional trailing `:` and nothing after it.
    Absent,
    /// Anything after the single-letter code is ignored.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Shape {
    pub tag: &'static str,
    pub kind: IntentKind,
    pub code: CodeField,
    pub wallets: WalletField,
}

pub(super) static SHAPES: [Shape; 7] = [
    Shape { tag: "N", kind: IntentKind::NewSubscription, code: CodeField::Tier, wallets: WalletField::Required },
    Shape { tag: "A", kind: IntentKind::AddWallet, code: CodeField::Placeholder, wallets: WalletField::Required },
    Shape { tag: "W", kind: IntentKind::WalletRenewal, code: CodeField::Placeholder, wallets: WalletField::Required },
    Shape { tag: "FS", kind: IntentKind::SubscriptionAddon, code: CodeField::Addon, wallets: WalletField::Absent },
    Shape { tag: "FW", kind: IntentKind::WalletAddon, code: CodeField::Addon, wallets: WalletField::Required },
    Shape { tag: "R", kind: IntentKind::SubscriptionRenewal, code: CodeField::Tier, wallets: WalletField::Ignored },
    Shape { tag: "U", kind: IntentKind::Upgrade, code: CodeField::Tier, wallets: WalletField::Ignored },
];

pub(super) fn shape_for(kind: IntentKind) -> &'static Shape {
    SHAPES
        .iter()
        .find(|s| s.kind == kind)
        .unwrap_or(&SHAPES[0])
}

/// Fields scanned out of a memo, before tier resolution and validation.
#[derive(Debug)]
pub(super) struct RawMemo<'a> {
    pub shape: &'static Shape,
    pub duration: u32,
    pub code: &'a str,
    pub wallets: Vec<String>,
}

/// Locate the owning shape and split the memo into its fields.
pub(super) fn scan(memo: &str) -> Result<RawMemo<'_>, AppError> {
    let (shape, body) = SHAPES
        .iter()
        .find_map(|shape| {
            memo.strip_prefix(shape.tag)
                .and_then(|rest| rest.strip_prefix('-'))
                .map(|body| (shape, body))
        })
        .ok_or_else(|| AppError::format(format!("unrecognised memo tag in '{memo}'")))?;

    let (duration_str, rest) = body
        .split_once('-')
        .ok_or_else(|| AppError::format(format!("missing code field in '{memo}'")))?;
    let duration = parse_duration(duration_str, memo)?;

    let (code, tail) = match (shape.wallets, rest.split_once(':')) {
        (WalletField::Ignored, _) => {
            let end = rest.chars().next().map_or(0, char::len_utf8);
            (&rest[..end], None)
        }
        (_, Some((code, tail))) => (code, Some(tail)),
        (_, None) => (rest, None),
    };
    check_code(shape.code, code, memo)?;

    let wallets = match (shape.wallets, tail) {
        (WalletField::Required, Some(list)) if !list.is_empty() => {
            list.split(',').map(|w| w.trim().to_string()).collect()
        }
        (WalletField::Required, _) => {
            return Err(AppError::format(format!("missing wallet list in '{memo}'")));
        }
        (WalletField::Absent, None) | (WalletField::Absent, Some("")) | (WalletField::Ignored, _) => {
            Vec::new()
        }
        (WalletField::Absent, Some(_)) => {
            return Err(AppError::format(format!(
                "unexpected data after ':' in '{memo}'"
            )));
        }
    };

    Ok(RawMemo { shape, duration, code, wallets })
}

fn parse_duration(field: &str, memo: &str) -> Result<u32, AppError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::format(format!("duration must be digits in '{memo}'")));
    }
    field
        .parse::<u32>()
        .map_err(|_| AppError::format(format!("duration out of range in '{memo}'")))
}

fn check_code(kind: CodeField, code: &str, memo: &str) -> Result<(), AppError> {
    let ok = match kind {
        CodeField::Tier => code.len() == 1 && code.bytes().all(|b| b.is_ascii_uppercase()),
        CodeField::Placeholder => code == "X",
        CodeField::Addon => is_addon_code(code),
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::format(format!("malformed code field '{code}' in '{memo}'")))
    }
}

pub(super) fn is_addon_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_kind_once() {
        for kind in IntentKind::ALL {
            assert_eq!(SHAPES.iter().filter(|s| s.kind == kind).count(), 1, "{kind:?}");
            assert_eq!(shape_for(kind).kind, kind);
        }
    }

    #[test]
    fn scan_splits_fields() {
        let raw = scan("N-3-S:aaa.gm, bbb.gm").unwrap();
        assert_eq!(raw.shape.kind, IntentKind::NewSubscription);
        assert_eq!(raw.duration, 3);
        assert_eq!(raw.code, "S");
        assert_eq!(raw.wallets, vec!["aaa.gm", "bbb.gm"]);
    }

    #[test]
    fn two_letter_tags_resolve() {
        assert_eq!(scan("FS-1-REPAIR:").unwrap().shape.kind, IntentKind::SubscriptionAddon);
        assert_eq!(scan("FW-2-ENERGY:aaa.gm").unwrap().shape.kind, IntentKind::WalletAddon);
    }

    #[test]
    fn trailing_colon_optional_for_walletless_shapes() {
        assert!(scan("R-6-S").is_ok());
        assert!(scan("R-6-S:").is_ok());
        assert!(scan("FS-1-REPAIR").is_ok());
        assert!(scan("FS-1-REPAIR:").is_ok());
        assert!(scan("FS-1-REPAIR:extra").is_err());
    }

    #[test]
    fn renewal_and_upgrade_ignore_trailing_text() {
        for memo in ["R-6-S:note", "R-6-Sx", "U-0-P:abc", "U-0-Pxyz", "U-1-B:aaa.gm,bbb.gm"] {
            let raw = scan(memo).unwrap_or_else(|e| panic!("{memo}: {e}"));
            assert_eq!(raw.code.len(), 1, "{memo}");
            assert!(raw.wallets.is_empty(), "{memo}");
        }
        assert_eq!(scan("U-0-Pxyz").unwrap().code, "P");
        assert!(scan("R-6-").is_err());
        assert!(scan("R-6-s:note").is_err());
        assert!(scan("U-0-:P").is_err());
    }

    #[test]
    fn malformed_fields_rejected() {
        for memo in [
            "",
            "N",
            "N-",
            "N--B:aaa.gm",
            "N-x-B:aaa.gm",
            "N-+1-B:aaa.gm",
            "N-1-BB:aaa.gm",
            "N-1-b:aaa.gm",
            "N-1-B",
            "N-1-B:",
            "A-1-Y:aaa.gm",
            "FS-1-repair:",
            "FS-1-:",
            "Q-1-B:aaa.gm",
            "N-99999999999-B:aaa.gm",
            " N-1-B:aaa.gm",
        ] {
            assert!(scan(memo).is_err(), "expected '{memo}' to be rejected");
        }
    }
}
