use std::io::Write;

use churn_dash::data::loader::Encoding;
use tempfile::NamedTempFile;

pub const HEADER: &str = "CLIENTNUM,Categoria,Idade,Sexo,Educação,Faixa Salarial Anual,Limite,Valor Transacoes 12m,Taxa de Utilização Cartão";

const INCOME: [&str; 5] = [
    "Menos de $40K",
    "$40K - $60K",
    "$60K - $80K",
    "$80K - $120K",
    "$120K +",
];

/// A customer line; `cancelled` picks the status label.
pub fn customer_line(i: usize, cancelled: bool) -> String {
    format!(
        "{},{},{},{},Graduação,{},{},{},{:.3}",
        700_000_000 + i,
        if cancelled { "Cancelado" } else { "Cliente" },
        26 + i % 48,
        if i % 2 == 0 { "M" } else { "F" },
        INCOME[i % INCOME.len()],
        1500 + (i * 37) % 30_000,
        500 + (i * 11) % 15_000,
        (i % 1000) as f64 / 1000.0,
    )
}

/// Write `lines` (header included) to a temporary file with the given suffix.
pub fn write_file(suffix: &str, encoding: Encoding, lines: &[String]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    let text = lines.join("\n") + "\n";
    file.write_all(&encoding.encode(&text)).unwrap();
    file.flush().unwrap();
    file
}

/// `rows` customers, of which the first `cancelled` are cancelled, as Latin-1 CSV.
pub fn customers_csv(rows: usize, cancelled: usize) -> NamedTempFile {
    let mut lines = vec![HEADER.to_string()];
    lines.extend((0..rows).map(|i| customer_line(i, i < cancelled)));
    write_file(".csv", Encoding::Latin1, &lines)
}
