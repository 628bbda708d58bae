//! Motor da planilha "daily data": grade 100x26 de células `A1`..`Z100`.
//!
//! Cada célula guarda a entrada bruta digitada pelo usuário. Entradas que
//! começam com `=` são fórmulas, convertidas numa árvore de expressão
//! ([`Expr`]) e avaliadas sem `eval`. O motor mantém o grafo de dependências:
//! editar uma célula reavalia os dependentes em ordem topológica, ciclos
//! viram `#CYCLE!` e erros ficam contidos na célula (e nos dependentes).
//!
//! Desfazer/refazer é um histórico linear de edições `{cell, old, new}`; um
//! bloco colado entra como um passo só.

mod address;
mod engine;
mod formula;

pub use address::{CellId, COLS, ROWS};
pub use engine::{CellError, CellSnapshot, CellValue, Edit, HistoryEntry, Sheet, SheetDocument, SheetError};
pub use formula::{parse_formula, BinaryOp, Expr, Function, ParseError};
