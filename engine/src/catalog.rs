// Static resource catalog: display name, natural unit and standard-fuel
// coefficient (т.у.т per natural unit) for every tracked energy resource.
use energy_shared::models::ResourceDefinition;

pub const CUSTOM_RESOURCE_ID: &str = "custom";
pub const DEFAULT_RESOURCE_ID: &str = "electricity";

const fn def(
    id: &'static str,
    display_name: &'static str,
    natural_unit: &'static str,
    coefficient: f64,
) -> ResourceDefinition {
    ResourceDefinition {
        id,
        display_name,
        natural_unit,
        coefficient,
    }
}

// Liquid fuels measured in litres carry per-litre coefficients (0.001xxx).
const RESOURCES: &[ResourceDefinition] = &[
    def("coal_hard", "Уголь каменный", "т", 0.626),
    def("coal_briquette_hard", "Брикеты, шарики из угля каменного", "т", 0.8),
    def("lignite", "Лигнит (уголь бурый)", "т", 0.408),
    def("crude_oil", "Нефть сырая", "т", 1.43),
    def("gas_condensate", "Конденсат газовый", "т", 1.43),
    def("gas_natural", "Газ природный", "м³", 0.00117),
    def("gas_associated", "Газ нефтяной попутный", "м³", 0.00115),
    def("coke_coal", "Кокс и полукокс из угля", "т", 0.99),
    def("wood_waste", "Опилки и отходы древесные", "т", 0.361),
    def("gasoline_aviation", "Бензин авиационный", "л", 0.001093),
    def("gasoline_motor", "Бензин моторный", "л", 0.001103),
    def("jet_fuel_gasoline_type", "Топливо реактивное типа бензина", "л", 0.001131),
    def("kerosene", "Керосин", "л", 0.00119),
    def("diesel", "Дизельное топливо (Газойли)", "л", 0.001261),
    def("fuel_oil_heavy", "Мазут топочный", "т", 1.379),
    def("fuel_domestic", "Топливо печное бытовое", "т", 1.413),
    def("lpg", "Газ сжиженный (пропан и бутан)", "т", 1.57),
    def(
        "gas_refined",
        "Газы очищенные (этилен, пропилен, бутилен, бутадиен и пр.)",
        "т",
        1.57,
    ),
    def("gas_debenzined", "Газ отбензиненный", "м³", 0.00157),
    def("coke_petroleum", "Кокс нефтяной и сланцевый", "т", 1.08),
    def("bitumen", "Битумы нефтяной и сланцевый", "т", 0.544),
    def("gas_blast_furnace", "Газ доменный", "м³", 0.00014),
    def("gas_coke", "Газ коксовый", "м³", 0.00057),
    def("gas_refinery", "Газ, полученный перегонкой на НПЗ", "м³", 0.00117),
    def("electricity", "Электроэнергия", "кВт*ч", 0.000123),
    def("heat", "Теплоэнергия", "Гкал", 0.143),
    def("anthracite", "Антрацит", "т", 0.9348),
    def("wood", "Древесина", "т", 0.35),
    def("lignite_briquette", "Брикеты из угля бурого (лигнита)", "т", 0.556),
    def("coal_coking", "Уголь каменный коксующий", "т", 0.982),
    def("coal_energy_high_grade", "Уголь энергетический >23,865 МДж/кг", "т", 0.594),
    def("coal_concentrate", "Концентрат угольный", "т", 0.982),
    def("coal_energy_high_ash", "Уголь энергетический высокозольный", "т", 0.594),
    def("coal_tar", "Смолы из угля каменного", "т", 0.95),
    def("jet_fuel_kerosene_type", "Топливо реактивное типа керосина", "л", 0.001467),
    def("white_spirit", "Уайт-спирит", "л", 0.001488),
    def("lubricants", "Материалы смазочные", "л", 0.001433),
    def("charcoal", "Уголь древесный, включая агломерированный", "т", 1.051),
    def("gas_ferroalloy", "Ферросплавный газ", "м³", 0.00026),
    def(CUSTOM_RESOURCE_ID, "Свой ресурс…", "—", 0.0),
];

pub fn resources() -> &'static [ResourceDefinition] {
    RESOURCES
}

pub fn find_resource(id: &str) -> Option<&'static ResourceDefinition> {
    RESOURCES.iter().find(|r| r.id == id)
}

pub fn custom_resource() -> &'static ResourceDefinition {
    // The sentinel is the last entry of the table.
    &RESOURCES[RESOURCES.len() - 1]
}

/// Looks an id up, falling back to the custom sentinel for unknown ids.
pub fn resolve(id: &str) -> &'static ResourceDefinition {
    find_resource(id).unwrap_or_else(custom_resource)
}

pub fn is_custom(id: &str) -> bool {
    find_resource(id).map_or(true, |r| r.id == CUSTOM_RESOURCE_ID)
}
