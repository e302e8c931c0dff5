use tabled::{Table, settings::Style};

/// Consistent styling for every table this tool prints
pub(crate) trait MapedTable {
    fn styled(&mut self) -> &mut Self;
}

impl MapedTable for Table {
    fn styled(&mut self) -> &mut Self {
        self.with(Style::psql())
    }
}
