// ==========================================
// 销售生产力看板 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV/TXT (分隔文本) / Excel (.xlsx/.xls)
// 约定: 表头与所有值统一 TRIM 为文本，类型解释留给校验器
//       行号 = 表头之后的输入位置（1 起），全空行不丢弃
// ==========================================

use crate::domain::sale::RawRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sale_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// FileFormat - 由文件扩展名决定解析模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    DelimitedText,
    Spreadsheet,
}

impl FileFormat {
    /// 根据原始文件名判断格式（扩展名大小写不敏感）
    pub fn from_file_name(file_name: &str) -> ImportResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::DelimitedText),
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            "" => Err(ImportError::UnsupportedFormat(file_name.to_string())),
            _ => Err(ImportError::UnsupportedFormat(format!(".{}", ext))),
        }
    }
}

/// 表头检查：不能全空，非空列名不能重复
fn check_headers(source: &str, headers: &[String]) -> ImportResult<()> {
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::ParseError(format!(
            "{}: archivo sin encabezado",
            source
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(h.as_str()))
    {
        return Err(ImportError::ParseError(format!(
            "{}: columna duplicada en el encabezado: {}",
            source, dup
        )));
    }
    Ok(())
}

/// 按表头位置拼装一行，跳过空表头列
fn zip_row<I>(line: usize, headers: &[String], values: I) -> RawRecord
where
    I: IntoIterator<Item = String>,
{
    let pairs = headers
        .iter()
        .zip(values)
        .filter(|(header, _)| !header.is_empty())
        .map(|(header, value)| (header.clone(), value));
    RawRecord::from_pairs(line, pairs)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 短行允许；长行在下面单独拒绝
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(bytes);

        // 读取表头（去掉 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        check_headers("CSV", &headers)?;

        // 读取所有行；任一行出错则整体失败
        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = idx + 1;

            if record.len() > headers.len() {
                return Err(ImportError::ParseError(format!(
                    "CSV: la fila {} tiene {} columnas, el encabezado tiene {}",
                    line,
                    record.len(),
                    headers.len()
                )));
            }

            // 全空行同样保留，由校验器判为失败
            records.push(zip_row(
                line,
                &headers,
                record.iter().map(|v| v.trim().to_string()),
            ));
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格 → 文本
    ///
    /// 日期单元格输出 `YYYY-MM-DD HH:MM:SS`，其余沿用 calamine 的文本表示
    fn cell_to_text(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => cell.to_string(),
            },
            other => other.to_string().trim().to_string(),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        // xlsx / xls 自动识别
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 只读第一个 sheet
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            ImportError::ParseError("Excel: el libro no tiene hojas".to_string())
        })??;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or_else(|| {
            ImportError::ParseError("Excel: hoja sin encabezado".to_string())
        })?;

        let headers: Vec<String> = header_row.iter().map(Self::cell_to_text).collect();
        check_headers("Excel", &headers)?;

        // 数据行按表内位置编号（中间的空行也占一个行号）
        let records = rows
            .enumerate()
            .map(|(idx, data_row)| {
                zip_row(idx + 1, &headers, data_row.iter().map(Self::cell_to_text))
            })
            .collect();

        Ok(records)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    csv_delimiter: u8,
}

impl UniversalFileParser {
    pub fn new(csv_delimiter: u8) -> Self {
        Self { csv_delimiter }
    }

    /// 解析文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（仅用于判断格式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Err(UnsupportedFormat): 扩展名不支持（不读取任何内容）
    /// - Err(ParseError): 文件结构无法解析
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        match FileFormat::from_file_name(file_name)? {
            FileFormat::DelimitedText => CsvParser::new(self.csv_delimiter).parse_bytes(bytes),
            FileFormat::Spreadsheet => ExcelParser.parse_bytes(bytes),
        }
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_file_name("ventas.CSV").unwrap(),
            FileFormat::DelimitedText
        );
        assert_eq!(
            FileFormat::from_file_name("ventas.txt").unwrap(),
            FileFormat::DelimitedText
        );
        assert_eq!(
            FileFormat::from_file_name("ventas.xls").unwrap(),
            FileFormat::Spreadsheet
        );
        assert!(matches!(
            FileFormat::from_file_name("ventas.pdf"),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_file_name("ventas"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_parser_zips_and_trims() {
        let data = "IdCliente , FechaVenta,Monto,Producto\n  C1 ,2024-01-05, 100 ,Widget\nC2,2024-01-06,50,Gadget\n";
        let records = CsvParser::default().parse_bytes(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line(), 1);
        assert_eq!(records[0].get("IdCliente"), Some("C1"));
        assert_eq!(records[0].get("Monto"), Some("100"));
        assert_eq!(records[1].line(), 2);
        assert_eq!(records[1].get("Producto"), Some("Gadget"));
    }

    #[test]
    fn test_csv_parser_strips_bom() {
        let data = "\u{feff}IdCliente,Monto\nC1,10\n";
        let records = CsvParser::default().parse_bytes(data.as_bytes()).unwrap();
        assert_eq!(records[0].get("IdCliente"), Some("C1"));
    }

    #[test]
    fn test_csv_parser_keeps_blank_rows_in_position() {
        let data = "IdCliente,Monto\nC1,2.5\n,\nC2,3.0\n";
        let records = CsvParser::default().parse_bytes(data.as_bytes()).unwrap();

        // 全空行保留并占用行号
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].line(), 2);
        assert_eq!(records[1].get("IdCliente"), Some(""));
        assert_eq!(records[2].line(), 3);
        assert_eq!(records[2].get("IdCliente"), Some("C2"));
    }

    #[test]
    fn test_csv_parser_short_row_leaves_fields_absent() {
        let data = "IdCliente,Monto,Producto\nC1,10\n";
        let records = CsvParser::default().parse_bytes(data.as_bytes()).unwrap();

        assert_eq!(records[0].get("Monto"), Some("10"));
        assert_eq!(records[0].get("Producto"), None);
    }

    #[test]
    fn test_csv_parser_rejects_long_row() {
        let data = "IdCliente,Monto,Producto\nC1,10,Widget\nC2,20,Widget,extra\n";
        let result = CsvParser::default().parse_bytes(data.as_bytes());

        match result {
            Err(ImportError::ParseError(msg)) => assert!(msg.contains("fila 2"), "{}", msg),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_parser_rejects_duplicate_header() {
        let data = "IdCliente,Monto,Monto\nC1,10,20\n";
        let result = CsvParser::default().parse_bytes(data.as_bytes());

        match result {
            Err(ImportError::ParseError(msg)) => assert!(msg.contains("Monto"), "{}", msg),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_parser_custom_delimiter() {
        let data = "IdCliente;Monto\nC1;10,5\n";
        let records = CsvParser::new(b';').parse_bytes(data.as_bytes()).unwrap();
        assert_eq!(records[0].get("Monto"), Some("10,5"));
    }

    #[test]
    fn test_csv_parser_invalid_utf8_is_parse_error() {
        let mut data = b"IdCliente,Monto\nC1,10\n".to_vec();
        data.extend_from_slice(&[0xff, 0xfe, b',', b'1', b'\n']);

        let result = CsvParser::default().parse_bytes(&data);
        assert!(matches!(result, Err(ImportError::ParseError(_))));
    }

    #[test]
    fn test_csv_parser_empty_file_is_parse_error() {
        let result = CsvParser::default().parse_bytes(b"");
        assert!(matches!(result, Err(ImportError::ParseError(_))));
    }

    #[test]
    fn test_excel_parser_reads_first_sheet_as_text() {
        let bytes = include_bytes!("../../tests/fixtures/ventas_basic.xlsx");
        let records = ExcelParser.parse_bytes(bytes).unwrap();

        // 第二个 sheet 不读取
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line(), 1);
        assert_eq!(records[0].get("IdVenta"), Some("X-1"));
        assert_eq!(records[0].get("IdCliente"), Some("1001"));
        assert_eq!(records[0].get("FechaVenta"), Some("2024-01-05 00:00:00"));
        assert_eq!(records[0].get("Monto"), Some("100.5"));
        assert_eq!(records[1].get("Producto"), Some("Gadget"));
        assert_eq!(records[1].get("Monto"), Some("50"));
    }

    #[test]
    fn test_excel_parser_rejects_garbage() {
        let result = ExcelParser.parse_bytes(b"IdCliente,Monto\nC1,10\n");
        assert!(matches!(result, Err(ImportError::ParseError(_))));
    }

    #[test]
    fn test_universal_parser_rejects_before_reading() {
        let parser = UniversalFileParser::default();
        // 内容本身是合法 CSV，但扩展名不支持
        let result = parser.parse("ventas.json", b"IdCliente\nC1\n");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
