// src/sheet/engine.rs

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::address::{CellId, COLS, ROWS};
use super::formula::{parse_formula, BinaryOp, Expr, Function};

// Edições mais antigas que isso são descartadas do histórico
const MAX_HISTORY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    /// Fórmula malformada ou tipo incompatível
    Invalid,
    DivZero,
    /// Referência fora da grade
    Ref,
    Cycle,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CellError::Invalid => "#ERROR!",
            CellError::DivZero => "#DIV/0!",
            CellError::Ref => "#REF!",
            CellError::Cycle => "#CYCLE!",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(CellError),
}

// Em JSON: null, número, texto, booleano, ou o código do erro ("#DIV/0!")
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(text) => serializer.serialize_str(text),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Error(err) => serializer.collect_str(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub raw: String,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub cell: String,
    pub old: String,
    pub new: String,
}

/// Um passo do histórico: uma célula editada ou um bloco colado de uma vez.
/// Desfazer um bloco restaura todas as células dele.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Cell(Edit),
    Batch(Vec<Edit>),
}

impl HistoryEntry {
    pub fn edits(&self) -> &[Edit] {
        match self {
            HistoryEntry::Cell(edit) => std::slice::from_ref(edit),
            HistoryEntry::Batch(edits) => edits,
        }
    }
}

/// Forma persistida de uma planilha: só as entradas brutas e o histórico.
/// Os valores são sempre recalculados ao carregar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDocument {
    #[serde(default)]
    pub cells: BTreeMap<String, String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("célula inválida: {0}")]
    InvalidCell(String),
    #[error("nada para desfazer")]
    NothingToUndo,
    #[error("nada para refazer")]
    NothingToRedo,
    #[error("bloco colado em {anchor} passa da borda da grade")]
    PasteOutOfBounds { anchor: String },
}

#[derive(Debug)]
enum Content {
    Literal(CellValue),
    Formula(Expr),
    Malformed,
}

impl Content {
    fn from_raw(raw: &str) -> Self {
        if let Some(formula) = raw.strip_prefix('=') {
            return match parse_formula(formula) {
                Ok(expr) => Content::Formula(expr),
                Err(_) => Content::Malformed,
            };
        }

        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Content::Literal(CellValue::Number(n)),
            _ => Content::Literal(CellValue::Text(raw.to_string())),
        }
    }
}

#[derive(Debug)]
struct Cell {
    raw: String,
    content: Content,
    refs: Vec<CellId>,
    value: CellValue,
}

#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<CellId, Cell>,
    // precedente -> células cuja fórmula o lê
    dependents: HashMap<CellId, HashSet<CellId>>,
    history: Vec<HistoryEntry>,
    // quantas edições do histórico estão aplicadas
    cursor: usize,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: SheetDocument) -> Self {
        let mut sheet = Sheet::new();

        for (key, raw) in document.cells {
            match CellId::parse(&key) {
                Some(id) => sheet.store(id, raw),
                None => tracing::warn!("Ignorando célula inválida '{}' no documento", key),
            }
        }
        let all: Vec<CellId> = sheet.cells.keys().copied().collect();
        sheet.recalculate(all);

        let valid_history = document
            .history
            .iter()
            .flat_map(HistoryEntry::edits)
            .all(|edit| CellId::parse(&edit.cell).is_some());
        if valid_history {
            sheet.cursor = document.cursor.min(document.history.len());
            sheet.history = document.history;
        } else {
            tracing::warn!("Histórico da planilha com células inválidas; descartado");
        }

        sheet
    }

    pub fn to_document(&self) -> SheetDocument {
        SheetDocument {
            cells: self
                .cells
                .iter()
                .map(|(id, cell)| (id.to_string(), cell.raw.clone()))
                .collect(),
            history: self.history.clone(),
            cursor: self.cursor,
        }
    }

    pub fn cell_id(input: &str) -> Result<CellId, SheetError> {
        CellId::parse(input).ok_or_else(|| SheetError::InvalidCell(input.trim().to_string()))
    }

    pub fn raw(&self, id: &str) -> Result<&str, SheetError> {
        let id = Self::cell_id(id)?;
        Ok(self.raw_at(id))
    }

    pub fn value(&self, id: &str) -> Result<CellValue, SheetError> {
        let id = Self::cell_id(id)?;
        Ok(self
            .cells
            .get(&id)
            .map(|cell| cell.value.clone())
            .unwrap_or(CellValue::Empty))
    }

    /// Grava a entrada bruta de uma célula e recalcula os dependentes.
    /// Retorna `false` quando o valor já era esse (nada entra no histórico).
    pub fn set_cell(&mut self, id: &str, raw: impl Into<String>) -> Result<bool, SheetError> {
        let id = Self::cell_id(id)?;
        let raw = raw.into();
        let old = self.raw_at(id).to_string();
        if old == raw {
            return Ok(false);
        }

        self.record(HistoryEntry::Cell(Edit { cell: id.to_string(), old, new: raw.clone() }));
        self.apply(id, raw);
        Ok(true)
    }

    /// Cola um bloco de linhas a partir de `anchor` (canto superior esquerdo).
    /// O bloco inteiro vira um único passo do histórico e é recalculado uma vez.
    /// Retorna quantas células mudaram.
    pub fn paste(&mut self, anchor: &str, rows: &[Vec<String>]) -> Result<usize, SheetError> {
        let origin = Self::cell_id(anchor)?;

        let mut edits = Vec::new();
        for (dr, row) in rows.iter().enumerate() {
            for (dc, raw) in row.iter().enumerate() {
                let target = u32::try_from(dc)
                    .ok()
                    .zip(u32::try_from(dr).ok())
                    .and_then(|(dc, dr)| CellId::new(origin.col.checked_add(dc)?, origin.row.checked_add(dr)?))
                    .ok_or_else(|| SheetError::PasteOutOfBounds { anchor: origin.to_string() })?;

                let old = self.raw_at(target);
                if old != raw.as_str() {
                    edits.push(Edit { cell: target.to_string(), old: old.to_string(), new: raw.clone() });
                }
            }
        }

        if edits.is_empty() {
            return Ok(0);
        }
        let changed = edits.len();
        let targets = self.store_edits(&edits, |edit| edit.new.clone());
        self.recalculate(targets);
        self.record(HistoryEntry::Batch(edits));
        Ok(changed)
    }

    pub fn clear_cell(&mut self, id: &str) -> Result<bool, SheetError> {
        self.set_cell(id, String::new())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.history.len()
    }

    /// Desfaz o último passo; devolve as células restauradas.
    pub fn undo(&mut self) -> Result<Vec<CellId>, SheetError> {
        if !self.can_undo() {
            return Err(SheetError::NothingToUndo);
        }
        self.cursor -= 1;
        let entry = self.history[self.cursor].clone();
        let mut edits = entry.edits().to_vec();
        edits.reverse();
        let ids = self.store_edits(&edits, |edit| edit.old.clone());
        self.recalculate(ids.iter().copied());
        Ok(ids)
    }

    pub fn redo(&mut self) -> Result<Vec<CellId>, SheetError> {
        if !self.can_redo() {
            return Err(SheetError::NothingToRedo);
        }
        let entry = self.history[self.cursor].clone();
        self.cursor += 1;
        let ids = self.store_edits(entry.edits(), |edit| edit.new.clone());
        self.recalculate(ids.iter().copied());
        Ok(ids)
    }

    /// Exporta a menor área retangular que contém todas as células preenchidas,
    /// a partir de A1, como CSV. Com `values`, grava os valores calculados em vez
    /// das entradas brutas.
    pub fn export_csv(&self, values: bool) -> String {
        let Some(last_col) = self.cells.keys().map(|id| id.col).max() else {
            return String::new();
        };
        let last_row = self.cells.keys().map(|id| id.row).max().unwrap_or(1);

        let mut out = String::new();
        for row in 1..=last_row.min(ROWS) {
            let fields: Vec<String> = (0..=last_col.min(COLS - 1))
                .map(|col| {
                    let id = CellId { col, row };
                    let text = match self.cells.get(&id) {
                        None => String::new(),
                        Some(cell) if values => display_value(&cell.value),
                        Some(cell) => cell.raw.clone(),
                    };
                    csv_field(&text)
                })
                .collect();
            out.push_str(&fields.join(","));
            out.push_str("\r\n");
        }
        out
    }

    /// Todas as células não vazias, com entrada bruta e valor calculado.
    pub fn snapshot(&self) -> BTreeMap<String, CellSnapshot> {
        let mut ids: Vec<&CellId> = self.cells.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                let cell = &self.cells[id];
                (id.to_string(), CellSnapshot { raw: cell.raw.clone(), value: cell.value.clone() })
            })
            .collect()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    // --- Internos ---

    fn raw_at(&self, id: CellId) -> &str {
        self.cells.get(&id).map(|cell| cell.raw.as_str()).unwrap_or("")
    }

    fn apply(&mut self, id: CellId, raw: String) {
        self.store(id, raw);
        self.recalculate([id]);
    }

    // Uma edição nova depois de desfazer descarta o que podia ser refeito
    fn record(&mut self, entry: HistoryEntry) {
        self.history.truncate(self.cursor);
        self.history.push(entry);
        if self.history.len() > MAX_HISTORY {
            let overflow = self.history.len() - MAX_HISTORY;
            self.history.drain(..overflow);
        }
        self.cursor = self.history.len();
    }

    // Grava cada edição sem recalcular; células fora da grade (histórico
    // corrompido) são ignoradas
    fn store_edits(&mut self, edits: &[Edit], raw: impl Fn(&Edit) -> String) -> Vec<CellId> {
        let mut ids = Vec::with_capacity(edits.len());
        for edit in edits {
            if let Some(id) = CellId::parse(&edit.cell) {
                self.store(id, raw(edit));
                ids.push(id);
            }
        }
        ids
    }

    // Troca o conteúdo da célula e refaz as arestas do grafo. Não avalia nada.
    fn store(&mut self, id: CellId, raw: String) {
        if let Some(old) = self.cells.remove(&id) {
            for precedent in &old.refs {
                if let Some(set) = self.dependents.get_mut(precedent) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.dependents.remove(precedent);
                    }
                }
            }
        }

        if raw.is_empty() {
            return;
        }

        let content = Content::from_raw(&raw);
        let refs = match &content {
            Content::Formula(expr) => expr.references(),
            _ => Vec::new(),
        };
        for precedent in &refs {
            self.dependents.entry(*precedent).or_default().insert(id);
        }
        self.cells.insert(id, Cell { raw, content, refs, value: CellValue::Empty });
    }

    // Reavalia as raízes e todos os seus dependentes transitivos, em ordem
    // topológica (Kahn). O que não sai da fila está num ciclo ou depende de um.
    fn recalculate(&mut self, roots: impl IntoIterator<Item = CellId>) {
        let mut affected: HashSet<CellId> = HashSet::new();
        let mut queue: VecDeque<CellId> = roots.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !affected.insert(id) {
                continue;
            }
            if let Some(deps) = self.dependents.get(&id) {
                queue.extend(deps.iter().copied());
            }
        }

        let mut pending: HashMap<CellId, usize> = affected
            .iter()
            .map(|id| {
                let count = self
                    .cells
                    .get(id)
                    .map(|cell| cell.refs.iter().filter(|r| affected.contains(r)).count())
                    .unwrap_or(0);
                (*id, count)
            })
            .collect();

        let mut ready: Vec<CellId> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        ready.sort();
        let mut ready: VecDeque<CellId> = ready.into();

        let mut order = Vec::with_capacity(affected.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            if let Some(deps) = self.dependents.get(&id) {
                let mut unlocked: Vec<CellId> = Vec::new();
                for dep in deps {
                    if let Some(count) = pending.get_mut(dep) {
                        *count -= 1;
                        if *count == 0 {
                            unlocked.push(*dep);
                        }
                    }
                }
                unlocked.sort();
                ready.extend(unlocked);
            }
        }

        for id in order {
            let value = self.evaluate_cell(id);
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.value = value;
            }
        }

        for (id, count) in pending {
            if count > 0 {
                if let Some(cell) = self.cells.get_mut(&id) {
                    cell.value = CellValue::Error(CellError::Cycle);
                }
            }
        }
    }

    fn evaluate_cell(&self, id: CellId) -> CellValue {
        let Some(cell) = self.cells.get(&id) else {
            return CellValue::Empty;
        };

        match &cell.content {
            Content::Literal(value) => value.clone(),
            Content::Malformed => CellValue::Error(CellError::Invalid),
            Content::Formula(expr) => match self.eval(expr) {
                // "=A1" com A1 vazia mostra 0
                Ok(CellValue::Empty) => CellValue::Number(0.0),
                Ok(value) => value,
                Err(err) => CellValue::Error(err),
            },
        }
    }

    fn lookup(&self, id: CellId) -> Result<CellValue, CellError> {
        match self.cells.get(&id).map(|cell| &cell.value) {
            None => Ok(CellValue::Empty),
            Some(CellValue::Error(err)) => Err(*err),
            Some(value) => Ok(value.clone()),
        }
    }

    fn eval(&self, expr: &Expr) -> Result<CellValue, CellError> {
        match expr {
            Expr::Number(n) => Ok(CellValue::Number(*n)),
            Expr::Text(text) => Ok(CellValue::Text(text.clone())),
            Expr::Bool(b) => Ok(CellValue::Bool(*b)),
            Expr::Ref(id) => self.lookup(*id),
            Expr::InvalidRef(_) => Err(CellError::Ref),
            // Intervalo só faz sentido como argumento de função
            Expr::Range(..) => Err(CellError::Invalid),
            Expr::Neg(inner) => Ok(CellValue::Number(-to_number(&self.eval(inner)?)?)),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Call(Function::If, args) => {
                if truthy(&self.eval(&args[0])?)? {
                    self.eval(&args[1])
                } else {
                    match args.get(2) {
                        Some(otherwise) => self.eval(otherwise),
                        None => Ok(CellValue::Bool(false)),
                    }
                }
            }
            Expr::Call(function, args) => self.aggregate(*function, args),
        }
    }

    fn aggregate(&self, function: Function, args: &[Expr]) -> Result<CellValue, CellError> {
        let mut numbers: Vec<f64> = Vec::new();

        for arg in args {
            match arg {
                // Em intervalos e referências diretas, texto e vazio são ignorados
                Expr::Range(start, end) => {
                    for col in start.col..=end.col {
                        for row in start.row..=end.row {
                            if let CellValue::Number(n) = self.lookup(CellId { col, row })? {
                                numbers.push(n);
                            }
                        }
                    }
                }
                Expr::Ref(id) => {
                    if let CellValue::Number(n) = self.lookup(*id)? {
                        numbers.push(n);
                    }
                }
                other => numbers.push(to_number(&self.eval(other)?)?),
            }
        }

        let result: f64 = match function {
            Function::Sum => numbers.iter().sum(),
            Function::Average => {
                if numbers.is_empty() {
                    return Err(CellError::DivZero);
                }
                numbers.iter().sum::<f64>() / numbers.len() as f64
            }
            Function::Min => numbers.iter().copied().reduce(f64::min).unwrap_or(0.0),
            Function::Max => numbers.iter().copied().reduce(f64::max).unwrap_or(0.0),
            Function::Count => numbers.len() as f64,
            Function::If => return Err(CellError::Invalid),
        };

        // SUM de valores enormes estoura para infinito
        if !result.is_finite() {
            return Err(CellError::Invalid);
        }
        Ok(CellValue::Number(result))
    }
}

fn display_value(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(text) => text.clone(),
        CellValue::Bool(true) => "TRUE".to_string(),
        CellValue::Bool(false) => "FALSE".to_string(),
        CellValue::Error(err) => err.to_string(),
    }
}

// RFC 4180: aspas em volta quando há vírgula, aspas ou quebra de linha
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn to_number(value: &CellValue) -> Result<f64, CellError> {
    match value {
        CellValue::Number(n) => Ok(*n),
        CellValue::Empty => Ok(0.0),
        CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or(CellError::Invalid),
        CellValue::Error(err) => Err(*err),
    }
}

fn truthy(value: &CellValue) -> Result<bool, CellError> {
    match value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Number(n) => Ok(*n != 0.0),
        CellValue::Empty => Ok(false),
        CellValue::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        CellValue::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        CellValue::Text(_) => Err(CellError::Invalid),
        CellValue::Error(err) => Err(*err),
    }
}

// Texto compara sem diferenciar maiúsculas; texto fica acima de números
fn compare(left: &CellValue, right: &CellValue) -> Result<Ordering, CellError> {
    match (left, right) {
        (CellValue::Text(a), CellValue::Text(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
        (CellValue::Text(a), CellValue::Empty) => Ok(a.to_lowercase().cmp(&String::new())),
        (CellValue::Empty, CellValue::Text(b)) => Ok(String::new().cmp(&b.to_lowercase())),
        (CellValue::Text(_), _) => Ok(Ordering::Greater),
        (_, CellValue::Text(_)) => Ok(Ordering::Less),
        _ => {
            let a = to_number(left)?;
            let b = to_number(right)?;
            a.partial_cmp(&b).ok_or(CellError::Invalid)
        }
    }
}

fn binary(op: BinaryOp, left: &CellValue, right: &CellValue) -> Result<CellValue, CellError> {
    let arithmetic = |f: fn(f64, f64) -> f64| -> Result<CellValue, CellError> {
        let result = f(to_number(left)?, to_number(right)?);
        if result.is_finite() {
            Ok(CellValue::Number(result))
        } else {
            Err(CellError::Invalid)
        }
    };

    match op {
        BinaryOp::Add => arithmetic(|a, b| a + b),
        BinaryOp::Sub => arithmetic(|a, b| a - b),
        BinaryOp::Mul => arithmetic(|a, b| a * b),
        BinaryOp::Div => {
            if to_number(right)? == 0.0 {
                return Err(CellError::DivZero);
            }
            arithmetic(|a, b| a / b)
        }
        BinaryOp::Eq => Ok(CellValue::Bool(compare(left, right)? == Ordering::Equal)),
        BinaryOp::Ne => Ok(CellValue::Bool(compare(left, right)? != Ordering::Equal)),
        BinaryOp::Lt => Ok(CellValue::Bool(compare(left, right)? == Ordering::Less)),
        BinaryOp::Le => Ok(CellValue::Bool(compare(left, right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(CellValue::Bool(compare(left, right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(CellValue::Bool(compare(left, right)? != Ordering::Less)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(sheet: &Sheet, id: &str) -> f64 {
        match sheet.value(id).unwrap() {
            CellValue::Number(n) => n,
            other => panic!("{} deveria ser número, veio {:?}", id, other),
        }
    }

    fn err(sheet: &Sheet, id: &str) -> CellError {
        match sheet.value(id).unwrap() {
            CellValue::Error(e) => e,
            other => panic!("{} deveria ser erro, veio {:?}", id, other),
        }
    }

    #[test]
    fn literals_are_typed() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", " 42 ").unwrap();
        sheet.set_cell("A2", "widgets").unwrap();
        assert_eq!(num(&sheet, "A1"), 42.0);
        assert_eq!(sheet.value("A2").unwrap(), CellValue::Text("widgets".into()));
        assert_eq!(sheet.value("A3").unwrap(), CellValue::Empty);
    }

    #[test]
    fn evaluates_arithmetic_with_references() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "10").unwrap();
        sheet.set_cell("A2", "4").unwrap();
        sheet.set_cell("A3", "=(A1 - A2) * 2 + -1").unwrap();
        assert_eq!(num(&sheet, "A3"), 11.0);
    }

    #[test]
    fn editing_a_precedent_recomputes_dependents_transitively() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("B1", "=A1 * 10").unwrap();
        sheet.set_cell("C1", "=B1 + A1").unwrap();
        assert_eq!(num(&sheet, "C1"), 11.0);

        sheet.set_cell("a1", "2").unwrap();
        assert_eq!(num(&sheet, "B1"), 20.0);
        assert_eq!(num(&sheet, "C1"), 22.0);
    }

    #[test]
    fn aggregates_skip_text_and_blanks() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "2").unwrap();
        sheet.set_cell("A2", "note").unwrap();
        sheet.set_cell("A4", "6").unwrap();
        sheet.set_cell("B1", "=SUM(A1:A5)").unwrap();
        sheet.set_cell("B2", "=AVERAGE(A1:A5)").unwrap();
        sheet.set_cell("B3", "=COUNT(A1:A5)").unwrap();
        sheet.set_cell("B4", "=MAX(A1:A5, 3)").unwrap();
        sheet.set_cell("B5", "=MIN(A1:A5)").unwrap();
        assert_eq!(num(&sheet, "B1"), 8.0);
        assert_eq!(num(&sheet, "B2"), 4.0);
        assert_eq!(num(&sheet, "B3"), 2.0);
        assert_eq!(num(&sheet, "B4"), 6.0);
        assert_eq!(num(&sheet, "B5"), 2.0);

        sheet.set_cell("C1", "=AVERAGE(D1:D3)").unwrap();
        assert_eq!(err(&sheet, "C1"), CellError::DivZero);
    }

    #[test]
    fn range_sum_tracks_every_cell_in_the_range() {
        let mut sheet = Sheet::new();
        sheet.set_cell("C1", "=SUM(A1:B2)").unwrap();
        assert_eq!(num(&sheet, "C1"), 0.0);
        sheet.set_cell("B2", "5").unwrap();
        assert_eq!(num(&sheet, "C1"), 5.0);
    }

    #[test]
    fn conditionals_compare_numbers_and_text() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "12").unwrap();
        sheet.set_cell("B1", "=IF(A1 > 10, \"restock\", \"ok\")").unwrap();
        sheet.set_cell("B2", "=IF(A1 = 5, 1)").unwrap();
        sheet.set_cell("B3", "=IF(\"abc\" = \"ABC\", 1, 0)").unwrap();
        assert_eq!(sheet.value("B1").unwrap(), CellValue::Text("restock".into()));
        assert_eq!(sheet.value("B2").unwrap(), CellValue::Bool(false));
        assert_eq!(num(&sheet, "B3"), 1.0);
    }

    #[test]
    fn errors_are_contained_and_propagate_to_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "=1/0").unwrap();
        sheet.set_cell("A2", "=A1 + 1").unwrap();
        sheet.set_cell("A3", "=1 +").unwrap();
        sheet.set_cell("A4", "=AA1").unwrap();
        sheet.set_cell("A5", "=\"x\" * 2").unwrap();
        sheet.set_cell("A6", "=7").unwrap();
        assert_eq!(err(&sheet, "A1"), CellError::DivZero);
        assert_eq!(err(&sheet, "A2"), CellError::DivZero);
        assert_eq!(err(&sheet, "A3"), CellError::Invalid);
        assert_eq!(err(&sheet, "A4"), CellError::Ref);
        assert_eq!(err(&sheet, "A5"), CellError::Invalid);
        assert_eq!(num(&sheet, "A6"), 7.0);

        sheet.set_cell("A1", "3").unwrap();
        assert_eq!(num(&sheet, "A2"), 4.0);
    }

    #[test]
    fn cycles_are_detected_and_can_be_broken() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "=B1 + 1").unwrap();
        sheet.set_cell("B1", "=A1 + 1").unwrap();
        sheet.set_cell("C1", "=A1 * 2").unwrap();
        sheet.set_cell("D1", "=D1").unwrap();
        assert_eq!(err(&sheet, "A1"), CellError::Cycle);
        assert_eq!(err(&sheet, "B1"), CellError::Cycle);
        assert_eq!(err(&sheet, "C1"), CellError::Cycle);
        assert_eq!(err(&sheet, "D1"), CellError::Cycle);

        sheet.set_cell("B1", "5").unwrap();
        assert_eq!(num(&sheet, "A1"), 6.0);
        assert_eq!(num(&sheet, "C1"), 12.0);
    }

    #[test]
    fn undo_and_redo_walk_the_linear_history() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("B1", "=A1 + 1").unwrap();
        sheet.set_cell("A1", "5").unwrap();
        assert_eq!(num(&sheet, "B1"), 6.0);

        sheet.undo().unwrap();
        assert_eq!(sheet.raw("A1").unwrap(), "1");
        assert_eq!(num(&sheet, "B1"), 2.0);

        sheet.redo().unwrap();
        assert_eq!(num(&sheet, "B1"), 6.0);
        assert_eq!(sheet.redo(), Err(SheetError::NothingToRedo));

        sheet.undo().unwrap();
        sheet.undo().unwrap();
        sheet.undo().unwrap();
        assert_eq!(sheet.undo(), Err(SheetError::NothingToUndo));
        assert!(sheet.snapshot().is_empty());
    }

    #[test]
    fn new_edit_after_undo_drops_the_redo_tail() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("A1", "2").unwrap();
        sheet.undo().unwrap();
        sheet.set_cell("A2", "x").unwrap();

        assert!(!sheet.can_redo());
        assert_eq!(sheet.history().len(), 2);
        assert_eq!(
            sheet.history()[1],
            HistoryEntry::Cell(Edit { cell: "A2".into(), old: "".into(), new: "x".into() })
        );
    }

    #[test]
    fn unchanged_edits_are_not_recorded() {
        let mut sheet = Sheet::new();
        assert!(sheet.set_cell("A1", "1").unwrap());
        assert!(!sheet.set_cell("A1", "1").unwrap());
        assert!(!sheet.clear_cell("B7").unwrap());
        assert_eq!(sheet.history().len(), 1);
    }

    #[test]
    fn rejects_cells_outside_the_grid() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.set_cell("AA1", "1"), Err(SheetError::InvalidCell("AA1".into())));
        assert_eq!(sheet.set_cell("A101", "1"), Err(SheetError::InvalidCell("A101".into())));
    }

    #[test]
    fn document_round_trip_recomputes_values_and_keeps_history() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "3").unwrap();
        sheet.set_cell("A2", "=A1 * A1").unwrap();
        sheet.undo().unwrap();
        sheet.redo().unwrap();

        let json = serde_json::to_string(&sheet.to_document()).unwrap();
        let restored = Sheet::from_document(serde_json::from_str(&json).unwrap());

        assert_eq!(num(&restored, "A2"), 9.0);
        assert!(restored.can_undo());
        assert!(!restored.can_redo());
        assert_eq!(restored.snapshot(), sheet.snapshot());
    }

    #[test]
    fn snapshot_serialises_values_as_json_scalars() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "2").unwrap();
        sheet.set_cell("A2", "=A1/0").unwrap();
        let json = serde_json::to_value(sheet.snapshot()).unwrap();
        assert_eq!(json["A1"]["value"], 2.0);
        assert_eq!(json["A2"]["value"], "#DIV/0!");
        assert_eq!(json["A2"]["raw"], "=A1/0");
    }

    #[test]
    fn history_is_capped() {
        let mut sheet = Sheet::new();
        for i in 0..(MAX_HISTORY + 20) {
            sheet.set_cell("A1", i.to_string()).unwrap();
        }
        assert_eq!(sheet.history().len(), MAX_HISTORY);
        assert!(!sheet.can_redo());
    }

    #[test]
    fn aggregate_overflow_is_an_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1e308").unwrap();
        sheet.set_cell("A2", "1e308").unwrap();
        sheet.set_cell("B1", "=SUM(A1:A2)").unwrap();
        sheet.set_cell("B2", "=AVERAGE(A1:A2)").unwrap();
        sheet.set_cell("B3", "=MAX(A1:A2)").unwrap();
        assert_eq!(err(&sheet, "B1"), CellError::Invalid);
        assert_eq!(err(&sheet, "B2"), CellError::Invalid);
        assert_eq!(num(&sheet, "B3"), 1e308);
    }

    #[test]
    fn deeply_nested_formula_shows_an_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", format!("={}", "(".repeat(499))).unwrap();
        assert_eq!(err(&sheet, "A1"), CellError::Invalid);
        let json = serde_json::to_value(sheet.snapshot()).unwrap();
        assert_eq!(json["A1"]["value"], "#ERROR!");
    }

    fn block(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|row| row.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn paste_is_one_undoable_step() {
        let mut sheet = Sheet::new();
        sheet.set_cell("B2", "old").unwrap();
        sheet.set_cell("D1", "=SUM(B2:C3)").unwrap();

        let changed = sheet.paste("b2", &block(&[&["1", "2"], &["3", "=B2*10"]])).unwrap();
        assert_eq!(changed, 4);
        assert_eq!(num(&sheet, "C3"), 10.0);
        assert_eq!(num(&sheet, "D1"), 16.0);
        assert_eq!(sheet.history().len(), 3);

        sheet.undo().unwrap();
        assert_eq!(sheet.raw("B2").unwrap(), "old");
        assert_eq!(sheet.raw("C3").unwrap(), "");
        assert_eq!(num(&sheet, "D1"), 0.0);

        sheet.redo().unwrap();
        assert_eq!(num(&sheet, "D1"), 16.0);
    }

    #[test]
    fn paste_past_the_grid_edge_changes_nothing() {
        let mut sheet = Sheet::new();
        let result = sheet.paste("Z100", &block(&[&["1", "2"]]));
        assert_eq!(result, Err(SheetError::PasteOutOfBounds { anchor: "Z100".into() }));
        assert!(sheet.snapshot().is_empty());
        assert!(!sheet.can_undo());

        assert_eq!(sheet.paste("A1", &block(&[&[""]])).unwrap(), 0);
        assert!(!sheet.can_undo());
    }

    #[test]
    fn old_documents_with_single_cell_history_still_load() {
        let json = r#"{
            "cells": { "A1": "2" },
            "history": [{ "cell": "A1", "old": "", "new": "2" }],
            "cursor": 1
        }"#;
        let mut sheet = Sheet::from_document(serde_json::from_str(json).unwrap());
        assert!(sheet.can_undo());

        sheet.paste("B1", &block(&[&["x", "y"]])).unwrap();
        let document = sheet.to_document();
        let restored = Sheet::from_document(
            serde_json::from_str(&serde_json::to_string(&document).unwrap()).unwrap(),
        );
        assert_eq!(restored.history(), sheet.history());
        assert_eq!(restored.history()[1].edits().len(), 2);
    }

    #[test]
    fn exports_raw_or_computed_values_as_csv() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.export_csv(false), "");

        sheet.set_cell("A1", "2").unwrap();
        sheet.set_cell("B1", "=A1*3").unwrap();
        sheet.set_cell("A2", "drill, \"cordless\"").unwrap();
        sheet.set_cell("C2", "=1/0").unwrap();

        assert_eq!(
            sheet.export_csv(false),
            "2,=A1*3,\r\n\"drill, \"\"cordless\"\"\",,=1/0\r\n"
        );
        assert_eq!(
            sheet.export_csv(true),
            "2,6,\r\n\"drill, \"\"cordless\"\"\",,#DIV/0!\r\n"
        );
    }
}
