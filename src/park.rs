/// Um parque como o classificador e a sincronização o veem.
///
/// Construído a partir de uma linha da tabela por [`Record::to_park`](crate::airtable::types::Record::to_park).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Park {
    /// ID opaco do registro no Airtable.
    pub id: String,
    pub name: String,
    /// Nomes de estados extraídos; pode ser vazio.
    pub states: Vec<String>,
    /// Coluna de texto `States` bruta, usada no prompt quando não há lista.
    pub states_text: Option<String>,
    /// `(latitude, longitude)`.
    pub coordinates: Option<(f64, f64)>,
    pub description: Option<String>,
    /// Região já gravada na linha, extraída da lista.
    pub existing_region: Option<String>,
}

impl Park {
    /// Estados unidos para exibição, recorrendo ao texto bruto e depois a "Unknown".
    pub fn state_info(&self) -> String {
        if !self.states.is_empty() {
            self.states.join(", ")
        } else if let Some(text) = &self.states_text {
            text.clone()
        } else {
            "Unknown".to_string()
        }
    }
}
