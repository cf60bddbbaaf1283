//! Catalogue of light-absorbing particles (LAPs) known to the feeder.
//!
//! Each species has a field suffix (`mss_cnc_<key>` / `FILE_<key>` in the
//! feeder's input record) and a file of single-scattering optical properties.
//! Glacier algae optics are tabulated per cell rather than per mass, which is
//! carried by [`Lap::requires_cell_to_mass_conversion`] instead of relying on
//! the position of the species in a list.

/// A light-absorbing particle species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lap {
    /// Uncoated black carbon (Bohren and Huffman, 1983)
    Soot1,
    /// Sulfate-coated black carbon (Bohren and Huffman, 1983)
    Soot2,
    /// Uncoated brown carbon (Kirchstetter et al., 2004)
    BrownCarbon1,
    /// Sulfate-coated brown carbon (Kirchstetter et al., 2004)
    BrownCarbon2,
    /// Mineral dust, size bin 1 (Balkanski et al., 2007)
    Dust1,
    /// Mineral dust, size bin 2 (Balkanski et al., 2007)
    Dust2,
    /// Mineral dust, size bin 3 (Balkanski et al., 2007)
    Dust3,
    /// Mineral dust, size bin 4 (Balkanski et al., 2007)
    Dust4,
    /// Mineral dust, size bin 5 (Balkanski et al., 2007)
    Dust5,
    /// Volcanic ash, size bin 1 (Flanner et al., 2014)
    Ash1,
    /// Volcanic ash, size bin 2 (Flanner et al., 2014)
    Ash2,
    /// Volcanic ash, size bin 3 (Flanner et al., 2014)
    Ash3,
    /// Volcanic ash, size bin 4 (Flanner et al., 2014)
    Ash4,
    /// Volcanic ash, size bin 5 (Flanner et al., 2014)
    Ash5,
    /// Ash from Mount St. Helens
    AshStHelens,
    /// Colorado dust, size bin 1 (Skiles et al., 2017)
    SkilesDust1,
    /// Colorado dust, size bin 2 (Skiles et al., 2017)
    SkilesDust2,
    /// Colorado dust, size bin 3 (Skiles et al., 2017)
    SkilesDust3,
    /// Colorado dust, size bin 4 (Skiles et al., 2017)
    SkilesDust4,
    /// Colorado dust, size bin 5 (Skiles et al., 2017)
    SkilesDust5,
    /// Greenland central dust, size bin 1 (Polashenski et al., 2015)
    GreenlandCentral1,
    /// Greenland central dust, size bin 2 (Polashenski et al., 2015)
    GreenlandCentral2,
    /// Greenland central dust, size bin 3 (Polashenski et al., 2015)
    GreenlandCentral3,
    /// Greenland central dust, size bin 4 (Polashenski et al., 2015)
    GreenlandCentral4,
    /// Greenland central dust, size bin 5 (Polashenski et al., 2015)
    GreenlandCentral5,
    /// Greenland dust, low hematite (Cook et al.)
    CookGreenlandDustLow,
    /// Greenland dust, central hematite (Cook et al.)
    CookGreenlandDustCentral,
    /// Greenland dust, high hematite (Cook et al.)
    CookGreenlandDustHigh,
    /// Spherical snow algae, C. nivalis (Cook et al., 2017)
    SnowAlgae,
    /// Glacier algae (Cook et al., 2020)
    GlacierAlgae,
}

impl Lap {
    /// Number of species in the catalogue (`nbr_aer`).
    pub const COUNT: usize = 30;

    /// Every species, in the feeder's order.
    pub const ALL: [Lap; Lap::COUNT] = [
        Lap::Soot1,
        Lap::Soot2,
        Lap::BrownCarbon1,
        Lap::BrownCarbon2,
        Lap::Dust1,
        Lap::Dust2,
        Lap::Dust3,
        Lap::Dust4,
        Lap::Dust5,
        Lap::Ash1,
        Lap::Ash2,
        Lap::Ash3,
        Lap::Ash4,
        Lap::Ash5,
        Lap::AshStHelens,
        Lap::SkilesDust1,
        Lap::SkilesDust2,
        Lap::SkilesDust3,
        Lap::SkilesDust4,
        Lap::SkilesDust5,
        Lap::GreenlandCentral1,
        Lap::GreenlandCentral2,
        Lap::GreenlandCentral3,
        Lap::GreenlandCentral4,
        Lap::GreenlandCentral5,
        Lap::CookGreenlandDustLow,
        Lap::CookGreenlandDustCentral,
        Lap::CookGreenlandDustHigh,
        Lap::SnowAlgae,
        Lap::GlacierAlgae,
    ];

    /// Field suffix used by the feeder, e.g. `soot1` for `mss_cnc_soot1`.
    pub fn key(self) -> &'static str {
        self.entry().0
    }

    /// File name of the species' optical properties.
    pub fn optics_file(self) -> &'static str {
        self.entry().1
    }

    /// Whether concentrations must be converted from cells to mass before
    /// they are combined with the optical properties.
    pub fn requires_cell_to_mass_conversion(self) -> bool {
        matches!(self, Lap::GlacierAlgae)
    }

    /// Whether the optical properties are theoretical only (not validated
    /// against field measurements).
    pub fn is_theoretical(self) -> bool {
        matches!(self, Lap::SnowAlgae)
    }

    fn entry(self) -> (&'static str, &'static str) {
        match self {
            Lap::Soot1 => ("soot1", "mie_sot_ChC90_dns_1317.nc"),
            Lap::Soot2 => ("soot2", "miecot_slfsot_ChC90_dns_1317.nc"),
            Lap::BrownCarbon1 => ("brwnC1", "brC_Kirch_BCsd.nc"),
            Lap::BrownCarbon2 => ("brwnC2", "brC_Kirch_BCsd_slfcot.nc"),
            Lap::Dust1 => ("dust1", "dust_balkanski_central_size1.nc"),
            Lap::Dust2 => ("dust2", "dust_balkanski_central_size2.nc"),
            Lap::Dust3 => ("dust3", "dust_balkanski_central_size3.nc"),
            Lap::Dust4 => ("dust4", "dust_balkanski_central_size4.nc"),
            Lap::Dust5 => ("dust5", "dust_balkanski_central_size5.nc"),
            Lap::Ash1 => ("ash1", "volc_ash_eyja_central_size1.nc"),
            Lap::Ash2 => ("ash2", "volc_ash_eyja_central_size2.nc"),
            Lap::Ash3 => ("ash3", "volc_ash_eyja_central_size3.nc"),
            Lap::Ash4 => ("ash4", "volc_ash_eyja_central_size4.nc"),
            Lap::Ash5 => ("ash5", "volc_ash_eyja_central_size5.nc"),
            Lap::AshStHelens => ("ash_st_helens", "volc_ash_mtsthelens_20081011.nc"),
            Lap::SkilesDust1 => ("Skiles_dust1", "dust_skiles_size1.nc"),
            Lap::SkilesDust2 => ("Skiles_dust2", "dust_skiles_size2.nc"),
            Lap::SkilesDust3 => ("Skiles_dust3", "dust_skiles_size3.nc"),
            Lap::SkilesDust4 => ("Skiles_dust4", "dust_skiles_size4.nc"),
            Lap::SkilesDust5 => ("Skiles_dust5", "dust_skiles_size5.nc"),
            Lap::GreenlandCentral1 => ("GreenlandCentral1", "dust_greenland_central_size1.nc"),
            Lap::GreenlandCentral2 => ("GreenlandCentral2", "dust_greenland_central_size2.nc"),
            Lap::GreenlandCentral3 => ("GreenlandCentral3", "dust_greenland_central_size3.nc"),
            Lap::GreenlandCentral4 => ("GreenlandCentral4", "dust_greenland_central_size4.nc"),
            Lap::GreenlandCentral5 => ("GreenlandCentral5", "dust_greenland_central_size5.nc"),
            Lap::CookGreenlandDustLow => {
                ("Cook_Greenland_dust_L", "dust_greenland_Cook_LOW_20190911.nc")
            }
            Lap::CookGreenlandDustCentral => {
                ("Cook_Greenland_dust_C", "dust_greenland_Cook_CENTRAL_20190911.nc")
            }
            Lap::CookGreenlandDustHigh => {
                ("Cook_Greenland_dust_H", "dust_greenland_Cook_HIGH_20190911.nc")
            }
            Lap::SnowAlgae => (
                "snw_alg",
                "snw_alg_r025um_chla020_chlb025_cara150_carb140.nc",
            ),
            Lap::GlacierAlgae => ("glacier_algae", "Cook2020_glacier_algae_4_40.nc"),
        }
    }

    /// Look up a species by its feeder key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lap| lap.key() == key)
    }
}
