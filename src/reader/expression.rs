use crate::error::TxPeaksError;
use crate::options::ExpressionLayout;
use crate::txpeaks_utils::{get_reader_from_path, FileFormat};
use anyhow::Context;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// One isoform of an expression quantification table.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionRecord {
    pub isoform_id: String,
    pub length: i64,
    pub value: f64,
}

/// Reads a (plain or gzipped) expression table such as cufflinks' `isoforms.fpkm_tracking`.
/// The columns are located through `layout`.
pub fn read_expression<T: AsRef<Path>>(
    file_path: T,
    layout: &ExpressionLayout,
) -> anyhow::Result<Vec<ExpressionRecord>> {
    let file_path = file_path.as_ref();
    let rdr = get_reader_from_path(file_path).with_context(|| {
        format!(
            "Could not open the expression file {:?}",
            file_path.as_os_str()
        )
    })?;
    let records = _read_expression(rdr, layout)?;
    info!(
        "Loaded {} isoforms from the expression file.",
        records.len()
    );
    Ok(records)
}

pub(crate) fn _read_expression<T: BufRead>(
    rdr: T,
    layout: &ExpressionLayout,
) -> Result<Vec<ExpressionRecord>, TxPeaksError> {
    let mut records = Vec::new();
    for (lid, l) in rdr.lines().enumerate() {
        let line = l?;
        if lid < layout.header_lines || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < layout.min_columns() {
            return Err(TxPeaksError::format(
                FileFormat::FpkmTracking,
                lid + 1,
                format!(
                    "expected at least {} columns, found {}",
                    layout.min_columns(),
                    fields.len()
                ),
            ));
        }

        let length = fields[layout.length_column].parse::<i64>().map_err(|e| {
            TxPeaksError::format(
                FileFormat::FpkmTracking,
                lid + 1,
                format!(
                    "could not parse length `{}`: {}",
                    fields[layout.length_column], e
                ),
            )
        })?;
        let value = fields[layout.value_column].parse::<f64>().map_err(|e| {
            TxPeaksError::format(
                FileFormat::FpkmTracking,
                lid + 1,
                format!(
                    "could not parse expression value `{}`: {}",
                    fields[layout.value_column], e
                ),
            )
        })?;
        // NaN and infinities cannot be ranked against other isoforms
        if !value.is_finite() {
            return Err(TxPeaksError::format(
                FileFormat::FpkmTracking,
                lid + 1,
                format!(
                    "the expression value `{}` is not a finite number",
                    fields[layout.value_column]
                ),
            ));
        }

        records.push(ExpressionRecord {
            isoform_id: fields[layout.isoform_column].to_string(),
            length,
            value,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPKM_TRACKING: &[u8] = b"tracking_id\tclass_code\tnearest_ref_id\tgene_id\tgene_short_name\ttss_id\tlocus\tlength\tcoverage\tFPKM\tFPKM_conf_lo\tFPKM_conf_hi\tFPKM_status\n\
TCONS_1\t-\t-\tNM_001\tGENE1\tTSS1\tchr1:100-320\t70\t12.5\t5.25\t4.0\t6.5\tOK\n\
TCONS_2\t-\t-\tNR_002\tGENE1\tTSS1\tchr1:100-320\t70\t0\t0\t0\t0\tOK\n";

    #[test]
    fn test_read_expression() {
        let records = _read_expression(FPKM_TRACKING, &ExpressionLayout::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            ExpressionRecord {
                isoform_id: String::from("NM_001"),
                length: 70,
                value: 5.25,
            }
        );
        assert_eq!(records[1].value, 0.0);
    }

    #[test]
    fn test_custom_layout() {
        let data = b"id\tlength\tfpkm\nNM_001\t800\t1.5\n";
        let layout = ExpressionLayout {
            isoform_column: 0,
            length_column: 1,
            value_column: 2,
            header_lines: 1,
        };
        let records = _read_expression(&data[..], &layout).unwrap();
        assert_eq!(records[0].isoform_id, "NM_001");
        assert_eq!(records[0].length, 800);
    }

    #[test]
    fn test_malformed_expression() {
        let short = b"header\nNM_001\t800\n";
        assert!(_read_expression(&short[..], &ExpressionLayout::default()).is_err());

        let bad_value = b"h\nT\t-\t-\tNM_001\tG\tT\tchr1:1-2\t70\t1\tNaN?\n";
        match _read_expression(&bad_value[..], &ExpressionLayout::default()) {
            Err(TxPeaksError::Format { line, .. }) => assert_eq!(line, 2),
            _ => panic!("expected a format error"),
        }
    }

    #[test]
    fn test_non_finite_expression() {
        for value in ["nan", "NaN", "inf", "-inf"] {
            let data = format!(
                "h\nT1\t-\t-\tA\tG\tT\tchr1:1-2\t70\t1\t{}\nT2\t-\t-\tB\tG\tT\tchr1:1-2\t70\t1\t5.0\n",
                value
            );
            match _read_expression(data.as_bytes(), &ExpressionLayout::default()) {
                Err(TxPeaksError::Format { line, message, .. }) => {
                    assert_eq!(line, 2);
                    assert!(message.contains("finite"));
                }
                _ => panic!("expected a format error for `{}`", value),
            }
        }
    }
}
